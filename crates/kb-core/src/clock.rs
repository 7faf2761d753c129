//! The only place permitted to read the wall clock.
//!
//! Keeps the classifier and buffer logic pure functions of their inputs
//! (§4.E: "no clock read other than via timestamp fields").

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time, seconds-since-epoch. Used for `Channel.last_read_at` /
/// `last_post_at`.
#[must_use]
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Current time, milliseconds-since-epoch. Used for `Message.timestamp`.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
