//! 4.D Workspace — owns the (Buffer, Window) pairs keyed by channel id,
//! the active-channel pointer, and the navigation stack.

use crate::buffer::ChannelBuffer;
use crate::cursor_window::CursorWindow;
use kb_protocol::{thread_channel_id, Channel, ChannelId, MessageId};
use std::collections::{HashMap, VecDeque};

struct Slot {
    buffer: ChannelBuffer,
    window: CursorWindow,
    channel: Channel,
}

pub struct Workspace {
    channels: HashMap<ChannelId, Slot>,
    active_channel: Option<ChannelId>,
    navigation_stack: VecDeque<ChannelId>,
    stack_capacity: usize,
    boot_channel: Option<ChannelId>,
}

/// New fields overwrite; structural fields (`parent_channel`, `thread_id`,
/// `is_thread`) are preserved if the newer identity is shallower (§4.D).
fn merge_identity(existing: Channel, incoming: Channel) -> Channel {
    Channel {
        id: incoming.id,
        name: incoming.name,
        service: incoming.service,
        category: incoming.category.or(existing.category),
        starred: incoming.starred,
        last_read_at: incoming.last_read_at.or(existing.last_read_at),
        last_post_at: incoming.last_post_at.or(existing.last_post_at),
        mass: incoming.mass.or(existing.mass),
        is_thread: incoming.is_thread || existing.is_thread,
        thread_id: incoming.thread_id.or(existing.thread_id),
        parent_channel: incoming.parent_channel.or(existing.parent_channel),
        parent_message: incoming.parent_message.or(existing.parent_message),
    }
}

impl Workspace {
    #[must_use]
    pub fn new(stack_capacity: usize) -> Self {
        Self {
            channels: HashMap::new(),
            active_channel: None,
            navigation_stack: VecDeque::new(),
            stack_capacity,
            boot_channel: None,
        }
    }

    #[must_use]
    pub fn active_channel(&self) -> Option<&ChannelId> {
        self.active_channel.as_ref()
    }

    #[must_use]
    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.get(id).map(|s| &s.channel)
    }

    #[must_use]
    pub fn channel_mut(&mut self, id: &ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(id).map(|s| &mut s.channel)
    }

    #[must_use]
    pub fn buffer(&self, id: &ChannelId) -> Option<&ChannelBuffer> {
        self.channels.get(id).map(|s| &s.buffer)
    }

    #[must_use]
    pub fn window(&self, id: &ChannelId) -> Option<&CursorWindow> {
        self.channels.get(id).map(|s| &s.window)
    }

    #[must_use]
    pub fn window_mut(&mut self, id: &ChannelId) -> Option<&mut CursorWindow> {
        self.channels.get_mut(id).map(|s| &mut s.window)
    }

    pub fn channel_ids(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.keys()
    }

    /// Filter a buffer in place and propagate the change to its window.
    /// Returns `true` if anything was dropped.
    pub fn retain_virtual_buffer(&mut self, id: &ChannelId, keep: impl FnMut(&MessageId) -> bool) -> bool {
        let Some(slot) = self.channels.get_mut(id) else {
            return false;
        };
        let changed = slot.buffer.retain(keep);
        if changed {
            slot.window.on_buffer_change(&slot.buffer);
        }
        changed
    }

    /// Sweep every buffer for an ack re-key (§4.I): a buffer holding both
    /// ids drops `old_id`; a buffer holding only `old_id` has it replaced
    /// with `new_id` in place.
    pub fn rekey_message_in_buffers(&mut self, old_id: &MessageId, new_id: &MessageId) {
        for slot in self.channels.values_mut() {
            let has_old = slot.buffer.contains(old_id);
            let has_new = slot.buffer.contains(new_id);
            let changed = if has_old && has_new {
                slot.buffer.remove(old_id)
            } else if has_old {
                slot.buffer
                    .position(old_id)
                    .is_some_and(|pos| slot.buffer.replace_at(pos, new_id.clone()))
            } else {
                false
            };
            if changed {
                slot.window.on_buffer_change(&slot.buffer);
            }
        }
    }

    /// Creates Buffer+Window if absent; merges identity otherwise. Returns
    /// `true` if this created a new slot.
    pub fn ensure(&mut self, identity: Channel) -> bool {
        match self.channels.get_mut(&identity.id) {
            Some(slot) => {
                let existing = std::mem::replace(&mut slot.channel, identity.clone());
                slot.channel = merge_identity(existing, identity);
                false
            }
            None => {
                self.channels.insert(
                    identity.id.clone(),
                    Slot {
                        buffer: ChannelBuffer::new(),
                        window: CursorWindow::new(),
                        channel: identity,
                    },
                );
                true
            }
        }
    }

    /// Ensures, pushes the previous active channel onto the stack if
    /// distinct, then sets active.
    pub fn open_channel(&mut self, identity: Channel) {
        let new_id = identity.id.clone();
        self.ensure(identity);
        if self.boot_channel.is_none() {
            self.boot_channel = Some(new_id.clone());
        }
        if let Some(prev) = self.active_channel.clone() {
            if prev != new_id {
                if self.navigation_stack.len() >= self.stack_capacity {
                    self.navigation_stack.pop_front();
                }
                self.navigation_stack.push_back(prev);
            }
        }
        self.active_channel = Some(new_id);
    }

    /// Synthesizes a thread identity (`id = "thread_" + rootId`) and opens
    /// it.
    pub fn open_thread(&mut self, root_id: &MessageId, parent_channel: &Channel) {
        let thread_id = thread_channel_id(root_id);
        let identity = Channel {
            id: thread_id,
            name: format!("thread:{root_id}"),
            service: parent_channel.service.clone(),
            category: None,
            starred: false,
            last_read_at: None,
            last_post_at: None,
            mass: None,
            is_thread: true,
            thread_id: Some(root_id.clone()),
            parent_channel: Some(parent_channel.id.clone()),
            parent_message: Some(root_id.clone()),
        };
        self.open_channel(identity);
    }

    /// Pops the stack; never crosses the initial boot channel (a no-op
    /// when the stack is empty).
    pub fn go_back(&mut self) -> Option<ChannelId> {
        let prev = self.navigation_stack.pop_back()?;
        self.active_channel = Some(prev.clone());
        Some(prev)
    }

    /// Jumps a channel's window to the tail of its buffer. No-op if the
    /// channel is unknown.
    pub fn jump_window_to_bottom(&mut self, id: &ChannelId) -> bool {
        let Some(slot) = self.channels.get_mut(id) else {
            return false;
        };
        slot.window.jump_to_bottom(&slot.buffer);
        true
    }

    /// `moveCursor(delta)` (§4.C) against a specific channel's window.
    /// No-op (and `false`) if the channel is unknown.
    pub fn move_cursor(&mut self, id: &ChannelId, delta: i64) -> bool {
        let Some(slot) = self.channels.get_mut(id) else {
            return false;
        };
        slot.window.move_cursor(delta, &slot.buffer);
        true
    }

    /// Sweeps every channel's buffer for `id` and drops it, propagating the
    /// change to each affected window. The entity itself is untouched —
    /// `removeMessage` (§6) removes a message from view, not from the
    /// store.
    pub fn remove_message_from_buffers(&mut self, id: &MessageId) {
        for slot in self.channels.values_mut() {
            if slot.buffer.remove(id) {
                slot.window.on_buffer_change(&slot.buffer);
            }
        }
    }

    /// Ensures the channel, then appends `id` to its buffer and propagates
    /// the change to its window. Returns `true` if the buffer changed.
    pub fn dispatch_message_id(&mut self, identity: Channel, id: MessageId) -> bool {
        let channel_id = identity.id.clone();
        self.ensure(identity);
        let slot = self.channels.get_mut(&channel_id).expect("just ensured");
        let changed = slot.buffer.append(id);
        if changed {
            slot.window.on_buffer_change(&slot.buffer);
        }
        changed
    }
}
