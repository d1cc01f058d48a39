//! In-memory binder service used by tests and demo wiring.
//!
//! `LoopbackTransport` records everything the client transmits and lets a
//! test script inject responses and indications on the callback stream. An
//! injected event resolves to the `CallbackStatus` the client replied with,
//! so tests can await full processing of an event before asserting.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::error::{Error, Result};
use crate::parcel::Parcel;
use crate::service_manager::{Connection, ServiceManager};
use crate::transport::{CallbackEvent, CallbackStatus, Transport, TxHandle};

const CALLBACK_CHANNEL_CAPACITY: usize = 64;

/// One payload captured from the client.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub code: i32,
    pub data: Bytes,
    pub tx: TxHandle,
}

#[derive(Debug, Default)]
struct LoopbackState {
    sent: Vec<SentRequest>,
    sync_sent: Vec<(i32, Bytes)>,
    sync_replies: VecDeque<Parcel>,
    cancelled: Vec<TxHandle>,
}

/// Client transport over an in-memory service.
#[derive(Debug)]
pub struct LoopbackTransport {
    state: Mutex<LoopbackState>,
    fail_sends: AtomicBool,
    closed: AtomicBool,
    next_tx: AtomicU64,
    // Held so the callback channel stays open for the connection's lifetime;
    // dropped on close().
    callbacks_tx: Mutex<Option<mpsc::Sender<CallbackEvent>>>,
}

impl LoopbackTransport {
    /// Create a transport plus the injector and callback receiver that go
    /// with it.
    pub fn new() -> (Arc<Self>, Injector, mpsc::Receiver<CallbackEvent>) {
        let (tx, rx) = mpsc::channel(CALLBACK_CHANNEL_CAPACITY);
        let transport = Arc::new(Self {
            state: Mutex::new(LoopbackState::default()),
            fail_sends: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            next_tx: AtomicU64::new(1),
            callbacks_tx: Mutex::new(Some(tx.clone())),
        });
        (transport, Injector { tx }, rx)
    }

    /// Make subsequent `transact` calls fail to queue.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Queue the reply for the next `transact_sync` call. With no scripted
    /// reply an empty parcel is returned.
    pub fn push_sync_reply(&self, parcel: Parcel) {
        self.state.lock().unwrap().sync_replies.push_back(parcel);
    }

    /// Everything transmitted one-way so far, in order.
    pub fn sent(&self) -> Vec<SentRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Synchronous calls made so far, in order.
    pub fn sync_sent(&self) -> Vec<(i32, Bytes)> {
        self.state.lock().unwrap().sync_sent.clone()
    }

    /// Transmission handles the client asked to cancel.
    pub fn cancelled(&self) -> Vec<TxHandle> {
        self.state.lock().unwrap().cancelled.clone()
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn transact(&self, code: i32, parcel: Parcel) -> Result<TxHandle> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::TransportClosed);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::TransmitFailed("scripted send failure".into()));
        }
        let tx = TxHandle(self.next_tx.fetch_add(1, Ordering::SeqCst));
        let data = parcel.freeze();
        trace!("loopback transact code={} len={} {}", code, data.len(), tx);
        self.state.lock().unwrap().sent.push(SentRequest { code, data, tx });
        Ok(tx)
    }

    async fn transact_sync(&self, code: i32, parcel: Parcel) -> Result<Parcel> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::TransportClosed);
        }
        let mut state = self.state.lock().unwrap();
        state.sync_sent.push((code, parcel.freeze()));
        Ok(state.sync_replies.pop_front().unwrap_or_default())
    }

    fn cancel(&self, handle: TxHandle) {
        if handle.is_active() {
            self.state.lock().unwrap().cancelled.push(handle);
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        // Dropping the sender ends the client's demux loop once any
        // remaining injector clones are gone too.
        self.callbacks_tx.lock().unwrap().take();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Test-side handle for pushing callback events at the client.
#[derive(Clone)]
pub struct Injector {
    tx: mpsc::Sender<CallbackEvent>,
}

impl Injector {
    /// Deliver a response callback and wait for the client to finish
    /// processing it. Returns the status the client replied with.
    pub async fn response(&self, code: i32, parcel: Parcel) -> CallbackStatus {
        let (status_tx, status_rx) = oneshot::channel();
        if self
            .tx
            .send(CallbackEvent::Response { code, parcel, status: Some(status_tx) })
            .await
            .is_err()
        {
            return CallbackStatus::Failed;
        }
        status_rx.await.unwrap_or(CallbackStatus::Failed)
    }

    /// Deliver an indication callback and wait for the client to finish
    /// processing it.
    pub async fn indication(&self, code: i32, parcel: Parcel) -> CallbackStatus {
        let (status_tx, status_rx) = oneshot::channel();
        if self
            .tx
            .send(CallbackEvent::Indication { code, parcel, status: Some(status_tx) })
            .await
            .is_err()
        {
            return CallbackStatus::Failed;
        }
        status_rx.await.unwrap_or(CallbackStatus::Failed)
    }
}

/// Per-service handles a test can script against after the client connected.
#[derive(Clone)]
pub struct LoopbackHandle {
    pub transport: Arc<LoopbackTransport>,
    pub injector: Injector,
}

/// In-memory service manager serving every name asked of it.
#[derive(Default)]
pub struct LoopbackServiceManager {
    services: Mutex<HashMap<String, LoopbackHandle>>,
}

impl LoopbackServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle for a service a client already looked up.
    pub fn handle(&self, name: &str) -> Option<LoopbackHandle> {
        self.services.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl ServiceManager for LoopbackServiceManager {
    async fn get_service(&self, name: &str) -> Result<Connection> {
        let (transport, injector, callbacks) = LoopbackTransport::new();
        self.services.lock().unwrap().insert(
            name.to_owned(),
            LoopbackHandle { transport: transport.clone(), injector },
        );
        Ok(Connection { transport, callbacks })
    }
}
