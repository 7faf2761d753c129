//! Newtype identifiers.
//!
//! The source data model treats ids as plain strings; we tag each kind so a
//! channel id and a message id can't be swapped at a call site by accident.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

newtype_id!(ServiceId);
newtype_id!(UserId);
newtype_id!(ChannelId);
newtype_id!(MessageId);

/// Reserved synthetic service ids (§3, §6).
pub mod reserved {
    /// Service id backing the `system` channel.
    pub const INTERNAL_SERVICE: &str = "internal";
    /// Service id backing the `triage`/`inbox` virtual channels.
    pub const AGGREGATION_SERVICE: &str = "aggregation";

    /// Synthetic channel ids created at startup.
    pub const SYSTEM_CHANNEL: &str = "system";
    pub const TRIAGE_CHANNEL: &str = "triage";
    pub const INBOX_CHANNEL: &str = "inbox";
}

/// Build the synthetic thread-channel id for a root message, exactly
/// `"thread_" + rootMessageId` (§6).
#[must_use]
pub fn thread_channel_id(root_message_id: &MessageId) -> ChannelId {
    ChannelId(format!("thread_{}", root_message_id.0))
}

/// Recover the root message id from a thread channel id, if `id` has the
/// `thread_` prefix.
#[must_use]
pub fn thread_root_id(id: &ChannelId) -> Option<MessageId> {
    id.0.strip_prefix("thread_").map(|s| MessageId(s.to_owned()))
}
