//! Wire-level transport events and commands (§6).
//!
//! Serializes/deserializes using the `event`/`command` field as a tag, the
//! same discriminated-union shape used for every WS message kind elsewhere
//! in this codebase.

use crate::ids::{ChannelId, MessageId, ServiceId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireUser {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireChannel {
    pub id: ChannelId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_post_at: Option<i64>,
    #[serde(default)]
    pub mass: u64,
    #[serde(default)]
    pub starred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub unread: u64,
    #[serde(default)]
    pub mentions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireReplies {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<MessageId>,
    pub body: String,
    pub timestamp: i64,
    pub author: WireUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<WireReplies>,
    #[serde(default)]
    pub reactions: std::collections::HashMap<String, Vec<UserId>>,
    #[serde(default)]
    pub attachments: Vec<crate::model::Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSubscriptionEntry {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub unread: bool,
}

/// Transport events (inbound), discriminated on `event` (§6 table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
#[serde(rename_all = "snake_case")]
pub enum InboundEvent {
    SelfInfo {
        service: ServiceId,
        user: WireUser,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel_prefix: Option<char>,
    },
    ChannelList {
        service: ServiceId,
        channels: Vec<WireChannel>,
    },
    UserList {
        service: ServiceId,
        users: Vec<WireUser>,
    },
    Message {
        service: ServiceId,
        channel_id: ChannelId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thread_id: Option<MessageId>,
        message: WireMessage,
    },
    MessageUpdate {
        message: WireMessageUpdate,
    },
    MessageDelete {
        message_id: MessageId,
    },
    MessageAck {
        client_id: MessageId,
        real_id: MessageId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    ThreadSubscriptionList {
        service: ServiceId,
        thread_ids: Vec<ThreadSubscriptionEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessageUpdate {
    pub id: MessageId,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionAction {
    Add,
    Remove,
}

/// Transport commands (outbound), discriminated on `command` (§6).
///
/// Every variant carries `service_id`/`channel_id` (the real parent channel
/// id for thread contexts) plus command-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command")]
#[serde(rename_all = "snake_case")]
pub enum OutboundCommand {
    SwitchChannel {
        service_id: ServiceId,
        channel_id: ChannelId,
    },
    FetchThread {
        service_id: ServiceId,
        channel_id: ChannelId,
        thread_id: MessageId,
    },
    PostMessage {
        service_id: ServiceId,
        channel_id: ChannelId,
        body: String,
        client_id: MessageId,
    },
    PostReply {
        service_id: ServiceId,
        channel_id: ChannelId,
        thread_id: MessageId,
        body: String,
        client_id: MessageId,
    },
    MessageUpdate {
        service_id: ServiceId,
        channel_id: ChannelId,
        message_id: MessageId,
        body: String,
    },
    MessageDelete {
        service_id: ServiceId,
        channel_id: ChannelId,
        message_id: MessageId,
    },
    React {
        service_id: ServiceId,
        channel_id: ChannelId,
        message_id: MessageId,
        reaction: String,
        action: ReactionAction,
    },
    MarkRead {
        service_id: ServiceId,
        channel_id: ChannelId,
        message_id: MessageId,
    },
    Typing {
        service_id: ServiceId,
        channel_id: ChannelId,
    },
    OpenPath {
        service_id: ServiceId,
        channel_id: ChannelId,
        after: String,
    },
    SaveToDownloads {
        service_id: ServiceId,
        channel_id: ChannelId,
        after: String,
    },
}
