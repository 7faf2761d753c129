//! Behavioral knobs the base model leaves implementation-defined.
//!
//! Follows the raw-then-resolved split used for forwarder config: a
//! `RawConfig` with every field optional (so a host app can load a partial
//! TOML/JSON document and get sensible defaults for the rest) resolved into
//! a fully-populated [`Config`].

use kb_protocol::ServiceId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfig {
    pub history_skew_tolerance_secs: Option<i64>,
    pub pending_hint_debounce_ms: Option<u64>,
    pub mark_read_ack_debounce_ms: Option<u64>,
    pub hydration_throttle_ms: Option<u64>,
    pub navigation_stack_capacity: Option<usize>,
    pub reconnect_backoff_ms: Option<u64>,
    #[serde(default)]
    pub per_message_read_services: HashSet<ServiceId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// §4.E history guard skew tolerance; fixed at 2s by the base model.
    pub history_skew_tolerance_secs: i64,
    /// §4.H pending cursor hint re-try debounce.
    pub pending_hint_debounce_ms: u64,
    /// §5 server mark-read scheduler debounce.
    pub mark_read_ack_debounce_ms: u64,
    /// §6 channel-list hydration spacing; empirical (Open Question 3).
    pub hydration_throttle_ms: u64,
    /// §4.D navigation stack cap.
    pub navigation_stack_capacity: usize,
    /// §4.J reconnect backoff reference value.
    #[serde(skip)]
    pub reconnect_backoff: Duration,
    /// Services with per-message read granularity (Open Question 1); these
    /// leave `unread.count` to decay as the cursor advances rather than
    /// clearing via `clearUnreadCount` on channel entry.
    pub per_message_read_services: HashSet<ServiceId>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_skew_tolerance_secs: 2,
            pending_hint_debounce_ms: 300,
            mark_read_ack_debounce_ms: 1000,
            hydration_throttle_ms: 200,
            navigation_stack_capacity: 50,
            reconnect_backoff: Duration::from_secs(3),
            per_message_read_services: HashSet::new(),
        }
    }
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        let defaults = Config::default();
        Self {
            history_skew_tolerance_secs: raw
                .history_skew_tolerance_secs
                .unwrap_or(defaults.history_skew_tolerance_secs),
            pending_hint_debounce_ms: raw
                .pending_hint_debounce_ms
                .unwrap_or(defaults.pending_hint_debounce_ms),
            mark_read_ack_debounce_ms: raw
                .mark_read_ack_debounce_ms
                .unwrap_or(defaults.mark_read_ack_debounce_ms),
            hydration_throttle_ms: raw
                .hydration_throttle_ms
                .unwrap_or(defaults.hydration_throttle_ms),
            navigation_stack_capacity: raw
                .navigation_stack_capacity
                .unwrap_or(defaults.navigation_stack_capacity),
            reconnect_backoff: raw
                .reconnect_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.reconnect_backoff),
            per_message_read_services: raw.per_message_read_services,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_config_partial_fills_with_defaults() {
        let raw = RawConfig {
            pending_hint_debounce_ms: Some(500),
            ..Default::default()
        };
        let cfg = Config::from(raw);
        assert_eq!(cfg.pending_hint_debounce_ms, 500);
        assert_eq!(cfg.mark_read_ack_debounce_ms, 1000);
        assert_eq!(cfg.history_skew_tolerance_secs, 2);
    }
}
