//! Shared wire vocabulary between the core and any transport adapter:
//! entity types, transport event/command envelopes, and emoji
//! canonicalization. Plays the same role here that `rt-protocol` plays for
//! the forwarder/server/receiver services.

pub mod emoji;
pub mod events;
pub mod ids;
pub mod model;

pub use events::{InboundEvent, OutboundCommand, ReactionAction, ThreadSubscriptionEntry, WireChannel, WireMessage, WireMessageUpdate, WireReplies, WireUser};
pub use ids::{reserved, thread_channel_id, thread_root_id, ChannelId, MessageId, ServiceId, UserId};
pub use model::{Attachment, Bucket, Channel, ChannelCategory, Identity, Message, MessageStatus, Service, UnreadState, User, VirtualCounts};
