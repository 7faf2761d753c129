//! Error taxonomy (§7).
//!
//! Most of the paths §7 describes are deliberately *not* errors: a stale
//! ack, a reaction on a vanished message, an unknown channel on a command —
//! all of these are no-ops, optionally logged, never propagated. The two
//! error enums below cover the handful of genuinely-fallible entry points.

use kb_protocol::{ChannelId, MessageId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown channel: {0}")]
    UnknownChannel(ChannelId),
    #[error("unknown message: {0}")]
    UnknownMessage(MessageId),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("receive failed: {0}")]
    Recv(String),
    #[error("malformed event: {0}")]
    Parse(String),
    #[error("disconnected")]
    Disconnected,
}
