//! 4.J / 4.M Transport Shim — a reconnecting bidirectional channel
//! abstraction, generalized over any concrete backend adapter.
//!
//! `Transport` is deliberately poll-based (non-blocking `try_send`/
//! `try_recv`), not `async_trait`: it keeps the "single-threaded
//! cooperative, nothing about applying an event is allowed to await"
//! guarantee (§5) structurally visible at the type level. `run_transport_loop`
//! is the async driver that owns a concrete `Transport` and does the
//! actual waiting, grounded in `services/receiver/src/session.rs`'s
//! `tokio::select!` event loop and `services/forwarder/src/uplink.rs`'s
//! connect/reconnect framing.

use crate::sys_log::LogLevel;
use kb_protocol::{InboundEvent, OutboundCommand};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// A minimal non-blocking bidirectional channel to a backend. Implementors
/// own their own reconnect details; `run_transport_loop` only calls
/// `connect`/`try_recv`/`send` and reacts to `TransportError::Disconnected`.
pub trait Transport: Send {
    /// Establish (or re-establish) the connection. Calling `try_recv`/`send`
    /// before a successful `connect` is a caller error.
    fn connect(&mut self) -> impl std::future::Future<Output = Result<(), crate::error::TransportError>> + Send;

    /// Non-blocking receive: `Ok(None)` means "nothing pending right now",
    /// distinct from an error or a clean disconnect (`Disconnected`).
    fn try_recv(&mut self) -> impl std::future::Future<Output = Result<Option<InboundEvent>, crate::error::TransportError>> + Send;

    fn send(&mut self, command: &OutboundCommand) -> impl std::future::Future<Output = Result<(), crate::error::TransportError>> + Send;
}

/// Owns a concrete `Transport`, drives reconnects with a fixed backoff, and
/// republishes a `TransportStatus` watch channel over `status_tx`. The
/// `Connected` transition on `status_tx` is the caller's cue to call
/// `Core::on_transport_connected` and feed the resulting `SwitchChannel`
/// (if any) back through `outbound`, so the backend resynchronizes on
/// reconnect (§4.J) — this loop only owns the wire, not `Core`, so it can't
/// look up the active channel itself. Every connect/send/recv failure is
/// also pushed onto `system_log` as `(LogLevel, String)` so the caller can
/// route it into `Core::log_system` and the `system` channel (§7, §4.L).
pub async fn run_transport_loop<T: Transport>(
    mut transport: T,
    backoff: Duration,
    mut outbound: mpsc::UnboundedReceiver<OutboundCommand>,
    inbound: mpsc::UnboundedSender<InboundEvent>,
    status_tx: watch::Sender<TransportStatus>,
    system_log: mpsc::UnboundedSender<(LogLevel, String)>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            let _ = status_tx.send(TransportStatus::Disconnected);
            return;
        }

        let _ = status_tx.send(TransportStatus::Connecting);
        if let Err(err) = transport.connect().await {
            tracing::warn!(%err, "transport connect failed, retrying after backoff");
            let _ = system_log.send((LogLevel::Warn, format!("transport connect failed: {err}")));
            let _ = status_tx.send(TransportStatus::Error);
            tokio::select! {
                () = sleep(backoff) => continue,
                _ = shutdown.changed() => continue,
            }
        }
        let _ = status_tx.send(TransportStatus::Connected);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    let _ = status_tx.send(TransportStatus::Disconnected);
                    return;
                }

                Some(command) = outbound.recv() => {
                    if let Err(err) = transport.send(&command).await {
                        tracing::warn!(%err, "transport send failed");
                        let _ = system_log.send((LogLevel::Warn, format!("transport send failed: {err}")));
                        // Disconnected while sending is most-fatal in this loop; the
                        // command queue doesn't buffer beyond `command`'s own drop
                        // (§5 backpressure: outbound is discarded while disconnected).
                        if matches!(err, crate::error::TransportError::Disconnected) {
                            break;
                        }
                    }
                }

                recv_result = transport.try_recv() => {
                    match recv_result {
                        Ok(Some(event)) => {
                            if inbound.send(event).is_err() {
                                return; // receiver dropped: shutting down
                            }
                        }
                        Ok(None) => {}
                        Err(crate::error::TransportError::Disconnected) => break,
                        Err(err) => {
                            tracing::warn!(%err, "transport parse/recv error, continuing");
                            let _ = system_log.send((LogLevel::Warn, format!("transport recv error: {err}")));
                        }
                    }
                }
            }
        }

        let _ = status_tx.send(TransportStatus::Disconnected);
        tokio::select! {
            () = sleep(backoff) => {}
            _ = shutdown.changed() => {}
        }
    }
}

#[cfg(feature = "ws-transport")]
pub mod ws {
    //! `WebSocketTransport` — a reference `Transport` over JSON-over-WebSocket,
    //! grounded in `services/forwarder/src/uplink.rs`'s connect/send/recv
    //! helpers.

    use super::Transport;
    use crate::error::TransportError;
    use futures_util::{SinkExt, StreamExt};
    use kb_protocol::{InboundEvent, OutboundCommand};
    use tokio_tungstenite::tungstenite::protocol::Message;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

    type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    pub struct WebSocketTransport {
        url: String,
        ws: Option<WsStream>,
    }

    impl WebSocketTransport {
        #[must_use]
        pub fn new(url: impl Into<String>) -> Self {
            Self { url: url.into(), ws: None }
        }
    }

    impl Transport for WebSocketTransport {
        async fn connect(&mut self) -> Result<(), TransportError> {
            let (ws, _response) = tokio_tungstenite::connect_async(&self.url)
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            self.ws = Some(ws);
            Ok(())
        }

        async fn try_recv(&mut self) -> Result<Option<InboundEvent>, TransportError> {
            let Some(ws) = self.ws.as_mut() else {
                return Err(TransportError::Disconnected);
            };
            match ws.next().await {
                None => Err(TransportError::Disconnected),
                Some(Err(e)) => Err(TransportError::Recv(e.to_string())),
                Some(Ok(Message::Text(text))) => serde_json::from_str(&text)
                    .map(Some)
                    .map_err(|e| TransportError::Parse(e.to_string())),
                Some(Ok(Message::Close(_))) => Err(TransportError::Disconnected),
                Some(Ok(Message::Ping(data))) => {
                    let _ = ws.send(Message::Pong(data)).await;
                    Ok(None)
                }
                Some(Ok(_)) => Ok(None),
            }
        }

        async fn send(&mut self, command: &OutboundCommand) -> Result<(), TransportError> {
            let Some(ws) = self.ws.as_mut() else {
                return Err(TransportError::Disconnected);
            };
            let json = serde_json::to_string(command).map_err(|e| TransportError::Send(e.to_string()))?;
            ws.send(Message::Text(json.into())).await.map_err(|e| TransportError::Send(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kb_protocol::MessageId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// An in-memory `Transport` that connects immediately, yields one queued
    /// inbound event, then reports `Disconnected` — enough to exercise the
    /// driver's reconnect path without pulling in `kb-test-support`.
    struct FlakyTransport {
        connect_calls: Arc<AtomicUsize>,
        events: Vec<InboundEvent>,
    }

    impl Transport for FlakyTransport {
        async fn connect(&mut self) -> Result<(), crate::error::TransportError> {
            self.connect_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn try_recv(&mut self) -> Result<Option<InboundEvent>, crate::error::TransportError> {
            match self.events.pop() {
                Some(event) => Ok(Some(event)),
                None => Err(crate::error::TransportError::Disconnected),
            }
        }

        async fn send(&mut self, _command: &OutboundCommand) -> Result<(), crate::error::TransportError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_after_disconnect_with_backoff() {
        let connect_calls = Arc::new(AtomicUsize::new(0));
        let transport = FlakyTransport {
            connect_calls: connect_calls.clone(),
            events: vec![InboundEvent::MessageAck {
                client_id: MessageId::from("tmp1"),
                real_id: MessageId::from("real1"),
                text: None,
            }],
        };
        let (_outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(TransportStatus::Disconnected);
        let (system_log_tx, mut system_log_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_transport_loop(
            transport,
            Duration::from_millis(10),
            outbound_rx,
            inbound_tx,
            status_tx,
            system_log_tx,
            shutdown_rx,
        ));

        let _first_event = inbound_rx.recv().await;
        assert_eq!(*status_rx.borrow(), TransportStatus::Connected);

        // Let a couple of reconnect cycles elapse under paused time.
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(connect_calls.load(Ordering::SeqCst) >= 2);

        shutdown_tx.send(true).unwrap();
        let _ = handle.await;
    }

    /// A `Transport` whose first `connect` fails, then succeeds.
    struct FailOnceTransport {
        attempts: Arc<AtomicUsize>,
    }

    impl Transport for FailOnceTransport {
        async fn connect(&mut self) -> Result<(), crate::error::TransportError> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(crate::error::TransportError::Connect("refused".into()));
            }
            Ok(())
        }

        async fn try_recv(&mut self) -> Result<Option<InboundEvent>, crate::error::TransportError> {
            Err(crate::error::TransportError::Disconnected)
        }

        async fn send(&mut self, _command: &OutboundCommand) -> Result<(), crate::error::TransportError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn connect_failure_is_forwarded_to_system_log() {
        let transport = FailOnceTransport { attempts: Arc::new(AtomicUsize::new(0)) };
        let (_outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, _inbound_rx) = mpsc::unbounded_channel();
        let (status_tx, _status_rx) = watch::channel(TransportStatus::Disconnected);
        let (system_log_tx, mut system_log_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_transport_loop(
            transport,
            Duration::from_millis(10),
            outbound_rx,
            inbound_tx,
            status_tx,
            system_log_tx,
            shutdown_rx,
        ));

        let (level, text) = system_log_rx.recv().await.unwrap();
        assert_eq!(level, LogLevel::Warn);
        assert!(text.contains("connect failed"));

        shutdown_tx.send(true).unwrap();
        let _ = handle.await;
    }
}
