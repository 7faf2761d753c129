//! The client-side state/interaction core for a keyboard-driven,
//! multi-service chat aggregator: entity storage, per-channel buffers and
//! cursor windows, bucket classification, dispatch/routing, read-state and
//! ack reconciliation, cursor positioning, and the transport shim that
//! feeds it. No UI, rendering, or backend-specific bridge lives here — see
//! `spec.md` §1 Non-goals.

pub mod ack_reconciler;
pub mod buffer;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod core;
pub mod cursor_window;
pub mod dispatch;
pub mod entity_store;
pub mod error;
pub mod ingest;
pub mod mutations;
pub mod navigation;
pub mod observable;
pub mod positioner;
pub mod read_manager;
pub mod sys_log;
pub mod transport;
pub mod workspace;

pub use buffer::ChannelBuffer;
pub use classifier::{classify, ClassifyInput};
pub use config::{Config, RawConfig};
pub use core::Core;
pub use cursor_window::CursorWindow;
pub use entity_store::EntityStore;
pub use error::{CoreError, TransportError};
pub use observable::{Observable, StateSnapshot};
pub use positioner::CursorHint;
pub use sys_log::{LogLevel, SysLog};
pub use transport::{run_transport_loop, Transport, TransportStatus};
pub use workspace::Workspace;

#[cfg(feature = "ws-transport")]
pub use transport::ws::WebSocketTransport;
