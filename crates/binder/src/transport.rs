//! The one-way binder transport the correlator is built on.
//!
//! Requests are fire-and-forget at this level: `transact` queues the payload
//! and returns a handle usable for best-effort cancellation of the wire
//! transmission. Correlation of responses happens entirely above this layer,
//! on the callback event stream the service-manager lookup hands out
//! alongside the transport.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::parcel::Parcel;

/// Opaque handle to a queued one-way transmission. Zero means "nothing left
/// to cancel" (the send already completed or never happened).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHandle(pub u64);

impl TxHandle {
    pub const NONE: TxHandle = TxHandle(0);

    pub fn is_active(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

/// Status reported back to the remote for a callback delivery, the
/// equivalent of the binder reply status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Ok,
    Failed,
}

/// One event on a registered callback endpoint.
///
/// Responses arrive on the response endpoint and carry a correlation serial
/// as their first payload field; indications arrive on the indication
/// endpoint and are never correlated to a request. `status`, when present,
/// must be answered once the event has been fully processed.
#[derive(Debug)]
pub enum CallbackEvent {
    Response {
        code: i32,
        parcel: Parcel,
        status: Option<oneshot::Sender<CallbackStatus>>,
    },
    Indication {
        code: i32,
        parcel: Parcel,
        status: Option<oneshot::Sender<CallbackStatus>>,
    },
}

/// Client side of a binder service connection.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Queue a one-way transaction. Returns a handle that can cancel the
    /// transmission while it is still in flight.
    async fn transact(&self, code: i32, parcel: Parcel) -> Result<TxHandle>;

    /// Synchronous call-and-wait. Used exactly once per connection, for the
    /// callback-endpoint registration handshake made before any asynchronous
    /// traffic is possible.
    async fn transact_sync(&self, code: i32, parcel: Parcel) -> Result<Parcel>;

    /// Best-effort cancellation of a still-queued transmission. The payload
    /// may already be on the wire; completion of the cancel is not reported.
    fn cancel(&self, handle: TxHandle);

    /// Release the connection. Closing drops the callback endpoints.
    async fn close(&self) -> Result<()>;

    fn is_closed(&self) -> bool;
}
