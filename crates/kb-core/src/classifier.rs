//! 4.E Bucket Classifier — pure, deterministic, first-match-wins ladder.

use kb_protocol::{Bucket, Channel, ChannelCategory, Identity, Message, MessageId};
use std::collections::HashSet;

/// `self` is `None` when identity for the message's service is unknown
/// (§7 "Identity absent" — classification proceeds, EGO cannot fire).
///
/// `msg.timestamp` is milliseconds-since-epoch; `channel.last_read_at` and
/// `thread_read_at` are seconds-since-epoch (§3). The history guard compares
/// them in the message's unit.
pub struct ClassifyInput<'a> {
    pub msg: &'a Message,
    pub channel: &'a Channel,
    pub identity: Option<&'a Identity>,
    pub participated_threads: &'a HashSet<MessageId>,
    /// Seconds; `None` defaults to 0 (unopened threads are always "after").
    pub thread_read_at: Option<i64>,
    pub history_skew_tolerance_secs: i64,
}

#[must_use]
pub fn classify(input: &ClassifyInput<'_>) -> Bucket {
    let ClassifyInput {
        msg,
        channel,
        identity,
        participated_threads,
        thread_read_at,
        history_skew_tolerance_secs,
    } = input;

    // 1. Self guard.
    if let Some(id) = identity {
        if msg.author.id == id.user.id {
            return Bucket::Noise;
        }
    }

    // 2. History guard (skew tolerance). `msg.timestamp` is ms; `last_read_at`
    // / `thread_read_at` are seconds, so both the read marker and the skew
    // tolerance are converted to ms before comparing.
    let skew_ms = *history_skew_tolerance_secs * 1000;
    if let Some(thread_id) = &msg.thread_id {
        let read_at_ms = thread_read_at.unwrap_or(0) * 1000;
        if msg.timestamp <= read_at_ms + skew_ms {
            return Bucket::Noise;
        }
        let _ = thread_id;
    } else {
        let read_at_ms = channel.last_read_at.unwrap_or(0) * 1000;
        if msg.timestamp <= read_at_ms + skew_ms {
            return Bucket::Noise;
        }
    }

    // 3. Ego check.
    if let Some(id) = identity {
        let mention = format!("@{}", id.user.name).to_lowercase();
        if msg.content.to_lowercase().contains(&mention) || msg.content.contains(id.user.id.as_str()) {
            return Bucket::Ego;
        }
    }

    // 4. Context check.
    if let Some(thread_id) = &msg.thread_id {
        if participated_threads.contains(thread_id) {
            return Bucket::Context;
        }
    }

    // 5. Direct DM.
    if channel.category == Some(ChannelCategory::Direct) {
        return Bucket::Ego;
    }

    // 6. Group DM.
    if channel.category == Some(ChannelCategory::Group) {
        return Bucket::Signal;
    }

    // 7. Starred channel.
    if channel.starred {
        return if msg.thread_id.is_some() {
            Bucket::Noise
        } else {
            Bucket::Signal
        };
    }

    // 8. Default.
    Bucket::Noise
}
