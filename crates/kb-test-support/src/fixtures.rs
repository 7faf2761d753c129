//! Builders for the entity types, trimming the struct-literal boilerplate
//! repeated across the core's unit and integration tests.

use kb_protocol::{
    thread_channel_id, Channel, Identity, Message, MessageId, ServiceId, User, UserId,
};

/// A "clearly in the future" timestamp, large enough that any channel's
/// `last_read_at * 1000` (seconds -> ms) in these fixtures sits well below
/// it. Use this for messages a test expects to classify as unread/new.
pub const FRESH_MS: i64 = 10_000_000;

#[must_use]
pub fn user(id: &str, name: &str) -> User {
    User {
        id: UserId::from(id),
        name: name.to_owned(),
        color: None,
        service_id: None,
        channel_prefix: None,
    }
}

#[must_use]
pub fn channel(id: &str, service: &str) -> Channel {
    Channel::new(kb_protocol::ChannelId::from(id), id, ServiceId::from(service))
}

/// The synthetic thread-channel identity a real root message would open
/// under, mirroring `Workspace::open_thread`.
#[must_use]
pub fn thread_channel(root_id: &MessageId, parent: &Channel) -> Channel {
    Channel {
        id: thread_channel_id(root_id),
        name: format!("thread:{root_id}"),
        service: parent.service.clone(),
        category: None,
        starred: false,
        last_read_at: None,
        last_post_at: None,
        mass: None,
        is_thread: true,
        thread_id: Some(root_id.clone()),
        parent_channel: Some(parent.id.clone()),
        parent_message: Some(root_id.clone()),
    }
}

#[must_use]
pub fn identity(service: &str, user_id: &str, name: &str) -> Identity {
    Identity {
        service_id: ServiceId::from(service),
        user: user(user_id, name),
        channel_prefix: Some('#'),
    }
}

/// A message authored by `author`, with every optional field at its default
/// save `timestamp`. Callers mutate the result (`thread_id`, `source_channel`,
/// ...) for the fields a given test cares about.
#[must_use]
pub fn message(id: &str, author: User, content: &str, timestamp_ms: i64) -> Message {
    Message {
        id: MessageId::from(id),
        client_id: None,
        status: None,
        author,
        content: content.to_owned(),
        timestamp: timestamp_ms,
        reactions: std::collections::HashMap::new(),
        reply_count: None,
        attachments: Vec::new(),
        thread_id: None,
        source_channel: None,
        bucket: None,
    }
}
