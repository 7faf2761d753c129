//! Structured logging sink for the internal `system` channel (§7, §4.L).
//!
//! Formats a timestamped entry, emits it through `tracing`, and builds a
//! synthetic [`Message`] for the `system` channel's buffer so a UI layer
//! can render it like any other message. Grounded in the broadcast/format
//! idiom of `rt-ui-log::UiLogger`, minus the ring buffer (the channel
//! buffer itself already retains history).

use kb_protocol::{reserved, Bucket, Message, MessageId, MessageStatus, User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Default)]
pub struct SysLog {
    next_seq: u64,
}

impl SysLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the synthetic `system`-channel message for a log entry and
    /// emit the matching `tracing` event. Bucket is fixed to `Noise` — the
    /// classifier never sees system entries.
    pub fn entry(&mut self, level: LogLevel, text: impl AsRef<str>, now: i64) -> Message {
        let text = text.as_ref();
        match level {
            LogLevel::Info => tracing::info!(target: "kb_core::system", "{text}"),
            LogLevel::Warn => tracing::warn!(target: "kb_core::system", "{text}"),
            LogLevel::Error => tracing::error!(target: "kb_core::system", "{text}"),
        }
        self.next_seq += 1;
        Message {
            id: MessageId::from(format!("sys_{}", self.next_seq)),
            client_id: None,
            status: Some(MessageStatus::Sent),
            author: User {
                id: UserId::from("system"),
                name: "system".to_owned(),
                color: None,
                service_id: None,
                channel_prefix: None,
            },
            content: text.to_owned(),
            timestamp: now,
            reactions: Default::default(),
            reply_count: None,
            attachments: vec![],
            thread_id: None,
            source_channel: Some(reserved::SYSTEM_CHANNEL.into()),
            bucket: Some(Bucket::Noise),
        }
    }
}
