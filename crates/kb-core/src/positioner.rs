//! 4.H Cursor Positioner — applies cursor hints on channel entry.

use crate::cursor_window::{MARKER_ALL_UNREAD, MARKER_NONE};
use crate::core::Core;
use kb_protocol::{Channel, ChannelId, MessageId};

/// `hint` argument to `switchChannel` (§4.H).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorHint {
    Bottom,
    Unread,
    JumpTo(MessageId),
}

impl Core {
    /// `switchChannel(channel, hint?)` (§6 Command API). Opens the channel
    /// via the Workspace, applies the cursor hint, and clears the advisory
    /// unread count on entry for services that don't track read state
    /// per-message (Open Question 1 — see DESIGN.md).
    pub fn switch_channel(&mut self, identity: Channel, hint: Option<CursorHint>) {
        let channel_id = identity.id.clone();
        let per_message_read = self.config.per_message_read_services.contains(&identity.service);
        self.workspace.open_channel(identity);
        self.apply_cursor_hint(&channel_id, hint);
        if !per_message_read {
            if let Some(state) = self.unread.get_mut(&channel_id) {
                state.count = 0;
                state.has_mention = false;
            }
        }
        self.publish();
    }

    /// External driver for the 300 ms pending-hint debounce (§5): re-tries
    /// a channel's stored `pending_cursor_hint` against its current buffer.
    /// No-op if there is nothing pending or the channel is unknown.
    pub fn retry_pending_hint(&mut self, channel_id: &ChannelId) {
        let Some(pending) = self.workspace.window(channel_id).and_then(|w| w.pending_cursor_hint.clone()) else {
            return;
        };
        self.apply_jump_to(channel_id, &pending);
        self.publish();
    }

    fn apply_cursor_hint(&mut self, channel_id: &ChannelId, hint: Option<CursorHint>) {
        match hint {
            Some(CursorHint::JumpTo(id)) => self.apply_jump_to(channel_id, &id),
            Some(CursorHint::Unread) => self.apply_unread_hint(channel_id),
            Some(CursorHint::Bottom) => self.apply_bottom_hint(channel_id),
            None => self.apply_preserve(channel_id),
        }
    }

    fn apply_jump_to(&mut self, channel_id: &ChannelId, id: &MessageId) {
        let Some((pos, len)) = self.workspace.buffer(channel_id).map(|b| (b.position(id), b.len())) else {
            return;
        };
        match pos {
            Some(idx) => {
                let marker = self.unread_marker_for(channel_id);
                if let Some(window) = self.workspace.window_mut(channel_id) {
                    window.cursor_index = idx as i64;
                    window.is_attached = false;
                    window.unread_marker_index = marker;
                    window.has_been_visited = true;
                    window.pending_cursor_hint = None;
                    window.last_selected_id = Some(id.clone());
                }
            }
            None if len < 5 => {
                if let Some(window) = self.workspace.window_mut(channel_id) {
                    window.pending_cursor_hint = Some(id.clone());
                    window.cursor_index = if len == 0 { -1 } else { (len - 1) as i64 };
                    window.is_attached = true;
                    window.has_been_visited = true;
                }
            }
            None => self.apply_bottom_hint_force(channel_id),
        }
    }

    /// Primary: first buffered id whose `timestamp` (ms) is past
    /// `lastReadAt * 1000` (ms). Fallback when `lastReadAt` is absent:
    /// `length - unread.count`, clamped into the buffer's range.
    fn first_unread_index(&self, channel_id: &ChannelId) -> i64 {
        let Some(buffer) = self.workspace.buffer(channel_id) else {
            return -1;
        };
        let len = buffer.len() as i64;
        if len == 0 {
            return -1;
        }
        if let Some(read_at) = self.workspace.channel(channel_id).and_then(|c| c.last_read_at) {
            let threshold_ms = read_at * 1000;
            buffer
                .ids()
                .iter()
                .position(|id| self.entities.get(id).is_some_and(|m| m.timestamp > threshold_ms))
                .map_or(-1, |i| i as i64)
        } else {
            (len - self.unread_state(channel_id).count as i64).clamp(0, len - 1)
        }
    }

    fn unread_marker_for(&self, channel_id: &ChannelId) -> i64 {
        match self.first_unread_index(channel_id) {
            i if i > 0 => i - 1,
            0 => MARKER_ALL_UNREAD,
            _ => MARKER_NONE,
        }
    }

    fn apply_unread_hint(&mut self, channel_id: &ChannelId) {
        let i = self.first_unread_index(channel_id);
        let len = self.workspace.buffer(channel_id).map_or(0, crate::buffer::ChannelBuffer::len) as i64;

        if let Some(window) = self.workspace.window_mut(channel_id) {
            if i > 0 {
                window.cursor_index = i - 1;
                window.is_attached = false;
                window.unread_marker_index = i - 1;
            } else if i == 0 {
                window.cursor_index = 0;
                window.is_attached = false;
                window.unread_marker_index = MARKER_ALL_UNREAD;
            } else {
                window.cursor_index = len - 1;
                window.is_attached = true;
                window.unread_marker_index = MARKER_NONE;
            }
            window.has_been_visited = true;
        }

        // Reconcile the advisory unread count with the computed span.
        let computed = if i >= 0 { (len - i).max(0) as u64 } else { 0 };
        let state = self.unread.entry(channel_id.clone()).or_default();
        state.count = computed;
    }

    /// Applied only on first visit; later switches preserve prior state.
    fn apply_bottom_hint(&mut self, channel_id: &ChannelId) {
        let visited = self.workspace.window(channel_id).is_some_and(|w| w.has_been_visited);
        if visited {
            return;
        }
        self.apply_bottom_hint_force(channel_id);
    }

    fn apply_bottom_hint_force(&mut self, channel_id: &ChannelId) {
        self.workspace.jump_window_to_bottom(channel_id);
        if let Some(window) = self.workspace.window_mut(channel_id) {
            window.has_been_visited = true;
            window.pending_cursor_hint = None;
        }
    }

    /// `undefined` hint: preserve state if already visited; else mark
    /// visited, leaving the cursor where `Workspace::ensure` left it.
    fn apply_preserve(&mut self, channel_id: &ChannelId) {
        if let Some(window) = self.workspace.window_mut(channel_id) {
            window.has_been_visited = true;
        }
    }
}
