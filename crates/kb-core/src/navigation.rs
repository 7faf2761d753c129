//! Workspace-navigation entries in the §6 Command API that don't belong to
//! any one component file: `openThread`, `goBack`, `moveCursor`, `jumpTo`,
//! `jumpToBottom`. Each is a thin wrapper over a `Workspace`/`CursorWindow`
//! primitive (4.C, 4.D) plus the snapshot republish every mutating command
//! does.

use crate::core::Core;
use kb_protocol::{ChannelId, MessageId};

impl Core {
    /// `openThread(msg)` (§6). Opens the synthetic `thread_<id>` channel
    /// rooted at `root_id`, parented to that message's `source_channel`.
    /// No-op if the message or its source channel is unknown.
    pub fn open_thread(&mut self, root_id: &MessageId) {
        let Some(parent_id) = self.entities.get(root_id).and_then(|m| m.source_channel.clone()) else {
            return;
        };
        let Some(parent) = self.workspace.channel(&parent_id).cloned() else {
            return;
        };
        self.workspace.open_thread(root_id, &parent);
        self.publish();
    }

    /// `goBack` (§6). Pops the navigation stack; no-op if it's empty.
    pub fn go_back(&mut self) -> Option<ChannelId> {
        let prev = self.workspace.go_back();
        if prev.is_some() {
            self.publish();
        }
        prev
    }

    /// `moveCursor(delta)` (§6, §4.C), applied to the active channel. Fails
    /// silently when there is no active channel or its buffer is empty.
    pub fn move_cursor(&mut self, delta: i64) {
        let Some(active) = self.workspace.active_channel().cloned() else {
            return;
        };
        self.workspace.move_cursor(&active, delta);
        self.publish();
    }

    /// `jumpTo(index)` (§6). The absolute-index form of `moveCursor`,
    /// expressed as a delta against the current cursor position.
    pub fn jump_to(&mut self, index: i64) {
        let Some(active) = self.workspace.active_channel().cloned() else {
            return;
        };
        let current = self.workspace.window(&active).map_or(0, |w| w.cursor_index);
        self.workspace.move_cursor(&active, index - current);
        self.publish();
    }

    /// `jumpToBottom` (§6, §4.C). No-op if there is no active channel.
    pub fn jump_to_bottom(&mut self) {
        let Some(active) = self.workspace.active_channel().cloned() else {
            return;
        };
        self.workspace.jump_window_to_bottom(&active);
        self.publish();
    }
}
