//! The UI-facing observable (§3 "Workspace state", §9 "Reactive stores").
//!
//! Any broadcast primitive satisfies this; we use `tokio::sync::watch`
//! since only the latest snapshot ever matters to a late subscriber (unlike
//! `broadcast`, which the teacher uses where every individual event must be
//! delivered, e.g. `rt-ui-log`'s `UiLogger`).

use kb_protocol::{ChannelId, UnreadState, VirtualCounts};
use std::collections::HashMap;
use tokio::sync::watch;

/// A cheap, clonable view of workspace-level state, re-emitted after every
/// mutating `Core` operation (§3, §9: "the notifier must iterate over a
/// snapshot of subscribers").
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub active_channel: Option<ChannelId>,
    pub cursor_index: i64,
    pub is_attached: bool,
    pub unread_marker_index: i64,
    pub unread: HashMap<ChannelId, UnreadState>,
    pub virtual_counts: VirtualCounts,
}

pub struct Observable {
    tx: watch::Sender<StateSnapshot>,
}

impl Observable {
    #[must_use]
    pub fn new() -> (Self, watch::Receiver<StateSnapshot>) {
        let (tx, rx) = watch::channel(StateSnapshot::default());
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.tx.subscribe()
    }

    /// Publish a new snapshot. Never invoked re-entrantly from within a
    /// subscriber (§5).
    pub fn publish(&self, snapshot: StateSnapshot) {
        let _ = self.tx.send(snapshot);
    }
}

impl Default for Observable {
    fn default() -> Self {
        Self::new().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_sees_published_snapshot() {
        let (obs, mut rx) = Observable::new();
        obs.publish(StateSnapshot {
            cursor_index: 3,
            ..Default::default()
        });
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().cursor_index, 3);
    }
}
