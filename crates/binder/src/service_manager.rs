//! Service-manager lookup boundary.
//!
//! The host daemon owns the binder device and hands out remote object
//! handles by fully-qualified service name. This layer only consumes that
//! lookup; the returned connection couples the one-way transport with the
//! callback event stream for the endpoints registered against it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::transport::{CallbackEvent, Transport};

/// A resolved service: the client transport plus the stream of callback
/// events (responses and indications) delivered back to this client.
pub struct Connection {
    pub transport: Arc<dyn Transport>,
    pub callbacks: mpsc::Receiver<CallbackEvent>,
}

/// Host-provided lookup of remote objects by versioned interface name, e.g.
/// `vendor.mediatek.hardware.mtkradioex@3.0::IMtkRadioEx/imsSlot1`.
#[async_trait]
pub trait ServiceManager: Send + Sync {
    async fn get_service(&self, name: &str) -> Result<Connection>;
}
