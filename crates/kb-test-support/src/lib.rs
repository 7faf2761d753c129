//! Shared test utilities for `kb-core`'s suite.
//!
//! Provides a mock `Transport` for exercising `run_transport_loop` without a
//! real backend, plus fixture builders for the entity types, mirroring the
//! role `rt-test-utils` plays for the forwarder/server/receiver services.

pub mod fixtures;
pub mod mock_transport;

pub use fixtures::{channel, identity, message, thread_channel, user, FRESH_MS};
pub use mock_transport::{MockTransport, MockTransportHandle};

#[cfg(test)]
mod tests {
    use super::*;
    use kb_core::{run_transport_loop, TransportStatus};
    use kb_protocol::{InboundEvent, MessageId};
    use std::time::Duration;
    use tokio::sync::{mpsc, watch};

    #[tokio::test(start_paused = true)]
    async fn mock_transport_delivers_pushed_events_and_reconnects() {
        let (transport, handle) = MockTransport::new();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(TransportStatus::Disconnected);
        let (system_log_tx, _system_log_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let loop_handle = tokio::spawn(run_transport_loop(
            transport,
            Duration::from_millis(10),
            outbound_rx,
            inbound_tx,
            status_tx,
            system_log_tx,
            shutdown_rx,
        ));

        handle.push_inbound(InboundEvent::MessageAck {
            client_id: MessageId::from("tmp1"),
            real_id: MessageId::from("real1"),
            text: None,
        });
        let first = inbound_rx.recv().await.unwrap();
        assert!(matches!(first, InboundEvent::MessageAck { .. }));
        assert_eq!(*status_rx.borrow(), TransportStatus::Connected);
        assert_eq!(handle.connect_calls(), 1);

        handle.drop_connection();
        // The loop's try_recv observes the drop on its next poll, then
        // reconnects after `backoff`.
        tokio::time::advance(Duration::from_millis(30)).await;
        assert!(handle.connect_calls() >= 2);

        drop(outbound_tx);
        shutdown_tx.send(true).unwrap();
        let _ = loop_handle.await;
    }

    #[tokio::test]
    async fn mock_transport_records_sent_commands() {
        use kb_protocol::{ChannelId, OutboundCommand, ServiceId};

        let (mut transport, handle) = MockTransport::new();
        let command = OutboundCommand::Typing {
            service_id: ServiceId::from("slack"),
            channel_id: ChannelId::from("c1"),
        };
        kb_core::Transport::connect(&mut transport).await.unwrap();
        kb_core::Transport::send(&mut transport, &command).await.unwrap();
        assert_eq!(handle.sent_commands().await, vec![command]);
    }

    #[test]
    fn fixtures_build_consistent_thread_identity() {
        let root = message("m1", user("u1", "Ada"), "hi", FRESH_MS);
        let parent = channel("general", "slack");
        let thread = thread_channel(&root.id, &parent);
        assert!(thread.is_thread);
        assert_eq!(thread.parent_channel, Some(parent.id));
    }
}
