//! 4.C Cursor Window — per-channel cursor/viewport state machine.

use crate::buffer::ChannelBuffer;
use kb_protocol::MessageId;

/// `unread_marker_index` encoding (§4.C):
/// `-1` = none; `-2` = "all messages are unread" (marker at top);
/// `k >= 0` = marker shown after index `k`.
pub const MARKER_NONE: i64 = -1;
pub const MARKER_ALL_UNREAD: i64 = -2;

#[derive(Debug, Clone, Default)]
pub struct CursorWindow {
    /// `-1` iff the buffer is empty (invariant 4).
    pub cursor_index: i64,
    pub is_attached: bool,
    pub unread_marker_index: i64,
    pub pending_cursor_hint: Option<MessageId>,
    pub has_been_visited: bool,
    pub last_selected_id: Option<MessageId>,
}

impl CursorWindow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cursor_index: -1,
            is_attached: true,
            unread_marker_index: MARKER_NONE,
            pending_cursor_hint: None,
            has_been_visited: false,
            last_selected_id: None,
        }
    }

    fn max_index(buffer: &ChannelBuffer) -> i64 {
        buffer.len() as i64 - 1
    }

    /// Clamps to `[0, max]`; sets `last_selected_id`; recomputes attach.
    /// Fails silently when the buffer is empty.
    pub fn move_cursor(&mut self, delta: i64, buffer: &ChannelBuffer) {
        if buffer.is_empty() {
            self.cursor_index = -1;
            return;
        }
        let max = Self::max_index(buffer);
        let next = (self.cursor_index + delta).clamp(0, max);
        self.cursor_index = next;
        self.last_selected_id = buffer.get(next as usize).cloned();
        self.is_attached = next == max;
    }

    pub fn jump_to_bottom(&mut self, buffer: &ChannelBuffer) {
        let max = Self::max_index(buffer);
        self.cursor_index = max;
        self.is_attached = true;
        self.last_selected_id = if max >= 0 {
            buffer.get(max as usize).cloned()
        } else {
            None
        };
        self.unread_marker_index = MARKER_NONE;
    }

    pub fn detach(&mut self, buffer: &ChannelBuffer) {
        self.is_attached = false;
        if self.cursor_index >= 0 {
            self.last_selected_id = buffer.get(self.cursor_index as usize).cloned();
        }
    }

    /// Called whenever the attached buffer mutates. If attached, track the
    /// tail; else try to restore the cursor to `last_selected_id`; if that
    /// id vanished, clamp into range.
    pub fn on_buffer_change(&mut self, buffer: &ChannelBuffer) {
        let max = Self::max_index(buffer);
        if max < 0 {
            self.cursor_index = -1;
            return;
        }
        if self.is_attached {
            self.cursor_index = max;
            self.last_selected_id = buffer.get(max as usize).cloned();
            return;
        }
        if let Some(id) = &self.last_selected_id {
            if let Some(pos) = buffer.position(id) {
                self.cursor_index = pos as i64;
                return;
            }
        }
        self.cursor_index = self.cursor_index.clamp(0, max);
        self.last_selected_id = buffer.get(self.cursor_index as usize).cloned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf_of(ids: &[&str]) -> ChannelBuffer {
        let mut b = ChannelBuffer::new();
        for id in ids {
            b.append(MessageId::from(*id));
        }
        b
    }

    #[test]
    fn move_cursor_clamps_and_sets_attach() {
        let buf = buf_of(&["a", "b", "c"]);
        let mut win = CursorWindow::new();
        win.move_cursor(1, &buf);
        assert_eq!(win.cursor_index, 0);
        win.move_cursor(-5, &buf);
        assert_eq!(win.cursor_index, 0);
        win.move_cursor(10, &buf);
        assert_eq!(win.cursor_index, 2);
        assert!(win.is_attached);
    }

    #[test]
    fn move_cursor_on_empty_buffer_is_silent() {
        let buf = ChannelBuffer::new();
        let mut win = CursorWindow::new();
        win.move_cursor(1, &buf);
        assert_eq!(win.cursor_index, -1);
    }

    #[test]
    fn jump_to_bottom_clears_marker() {
        let buf = buf_of(&["a", "b"]);
        let mut win = CursorWindow::new();
        win.unread_marker_index = 0;
        win.jump_to_bottom(&buf);
        assert_eq!(win.cursor_index, 1);
        assert!(win.is_attached);
        assert_eq!(win.unread_marker_index, MARKER_NONE);
    }

    #[test]
    fn on_buffer_change_tracks_tail_when_attached() {
        let mut buf = buf_of(&["a"]);
        let mut win = CursorWindow::new();
        win.jump_to_bottom(&buf);
        buf.append(MessageId::from("b"));
        win.on_buffer_change(&buf);
        assert_eq!(win.cursor_index, 1);
        assert!(win.is_attached);
    }

    #[test]
    fn on_buffer_change_restores_detached_cursor_by_id() {
        let mut buf = buf_of(&["a", "b", "c"]);
        let mut win = CursorWindow::new();
        win.move_cursor(1, &buf); // cursor at "b"
        win.detach(&buf);
        buf.prepend(MessageId::from("z"));
        win.on_buffer_change(&buf);
        assert_eq!(win.cursor_index, 2); // "b" shifted to index 2
    }

    #[test]
    fn on_buffer_change_clamps_when_selected_id_vanished() {
        let mut buf = buf_of(&["a", "b"]);
        let mut win = CursorWindow::new();
        win.move_cursor(1, &buf);
        win.detach(&buf);
        buf.remove(&MessageId::from("b"));
        win.on_buffer_change(&buf);
        assert_eq!(win.cursor_index, 0);
    }
}
