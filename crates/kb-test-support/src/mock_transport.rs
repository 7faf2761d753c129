//! An in-memory `Transport` for driving `run_transport_loop` in tests
//! without a real backend. Grounded in the role `rt-test-utils`'s
//! `MockWsClient`/`MockWsServer` pair plays for the forwarder/receiver
//! integration suite: a handle pushes events in and inspects what went out,
//! while the transport itself is handed to the code under test.

use kb_core::{Transport, TransportError};
use kb_protocol::{InboundEvent, OutboundCommand};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

struct Shared {
    sent: Mutex<Vec<OutboundCommand>>,
    connect_calls: AtomicUsize,
    fail_next_connect: AtomicBool,
    disconnected: AtomicBool,
}

pub struct MockTransport {
    shared: Arc<Shared>,
    inbound: mpsc::UnboundedReceiver<InboundEvent>,
}

/// The test-facing half: push inbound events, flip connect/disconnect
/// behavior, and inspect what the code under test sent.
#[derive(Clone)]
pub struct MockTransportHandle {
    shared: Arc<Shared>,
    inbound_tx: mpsc::UnboundedSender<InboundEvent>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> (Self, MockTransportHandle) {
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            sent: Mutex::new(Vec::new()),
            connect_calls: AtomicUsize::new(0),
            fail_next_connect: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
        });
        (
            Self { shared: shared.clone(), inbound },
            MockTransportHandle { shared, inbound_tx },
        )
    }
}

impl MockTransportHandle {
    pub fn push_inbound(&self, event: InboundEvent) {
        let _ = self.inbound_tx.send(event);
    }

    pub async fn sent_commands(&self) -> Vec<OutboundCommand> {
        self.shared.sent.lock().await.clone()
    }

    #[must_use]
    pub fn connect_calls(&self) -> usize {
        self.shared.connect_calls.load(Ordering::SeqCst)
    }

    /// The next `connect()` call fails once, then reverts to succeeding.
    pub fn fail_next_connect(&self) {
        self.shared.fail_next_connect.store(true, Ordering::SeqCst);
    }

    /// Makes `try_recv`/`send` report `Disconnected` until the next
    /// successful `connect()`.
    pub fn drop_connection(&self) {
        self.shared.disconnected.store(true, Ordering::SeqCst);
    }
}

impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.shared.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_next_connect.swap(false, Ordering::SeqCst) {
            return Err(TransportError::Connect("mock connect failure".into()));
        }
        self.shared.disconnected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn try_recv(&mut self) -> Result<Option<InboundEvent>, TransportError> {
        if self.shared.disconnected.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }
        match self.inbound.recv().await {
            Some(event) => Ok(Some(event)),
            None => Err(TransportError::Disconnected),
        }
    }

    async fn send(&mut self, command: &OutboundCommand) -> Result<(), TransportError> {
        if self.shared.disconnected.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }
        self.shared.sent.lock().await.push(command.clone());
        Ok(())
    }
}
