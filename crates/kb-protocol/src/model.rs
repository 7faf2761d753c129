//! Core data model (§3).

use crate::ids::{ChannelId, MessageId, ServiceId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque backend identifier. `internal`/`aggregation` are reserved for
/// synthetic channels (see [`crate::ids::reserved`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<ServiceId>,
    /// The character (`#` or `~`) the service uses when linkifying channel mentions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_prefix: Option<char>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelCategory {
    Channel,
    Direct,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub service: ServiceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ChannelCategory>,
    #[serde(default)]
    pub starred: bool,
    /// Seconds-since-epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read_at: Option<i64>,
    /// Seconds-since-epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_post_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<u64>,
    #[serde(default)]
    pub is_thread: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_channel: Option<ChannelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message: Option<MessageId>,
}

impl Channel {
    #[must_use]
    pub fn new(id: ChannelId, name: impl Into<String>, service: ServiceId) -> Self {
        Self {
            id,
            name: name.into(),
            service,
            category: None,
            starred: false,
            last_read_at: None,
            last_post_at: None,
            mass: None,
            is_thread: false,
            thread_id: None,
            parent_channel: None,
            parent_message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

/// Attention classification of a message (see GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Ego,
    Context,
    Signal,
    Noise,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// The optimistic id this message was sent under, if it originated locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
    pub author: User,
    pub content: String,
    /// Milliseconds-since-epoch (distinct unit from `Channel.last_read_at`,
    /// which is seconds — see `kb_core::classifier`).
    pub timestamp: i64,
    /// emojiKey -> user ids who reacted with it.
    #[serde(default)]
    pub reactions: HashMap<String, Vec<UserId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u64>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<MessageId>,
    /// The real channel this message came from; required for messages
    /// living in virtual buffers (invariant 2, §3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_channel: Option<ChannelId>,
    /// Cached classification (4.E).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<Bucket>,
}

impl Message {
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.thread_id.is_some()
    }
}

/// Per-channel advisory unread state (§3). The authoritative signal for "is
/// this unread" is `msg.timestamp > channel.last_read_at + 2s`; `count` is
/// only advisory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadState {
    pub count: u64,
    pub has_mention: bool,
}

/// A resolved per-service identity: who the local user is on that backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub service_id: ServiceId,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_prefix: Option<char>,
}

/// Aggregate virtual-channel population counts (§4.F step 9).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualCounts {
    pub triage: usize,
    pub inbox: usize,
}
