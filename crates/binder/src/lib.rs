//! Binder-flavored wire plumbing for the MediaTek IMS extension stack
//!
//! This crate provides the transport layer the radio-extension correlator is
//! built on: the parcel codec, the one-way `Transport` trait with best-effort
//! cancellation, the callback event stream carrying responses and indications
//! from the remote service, and the service-manager lookup boundary.
//!
//! The host daemon owns the real binder device; everything here is specified
//! at that boundary. The `loopback` module provides an in-memory service used
//! by tests and demo wiring.

mod error;
pub mod parcel;
pub mod transport;
mod service_manager;
pub mod loopback;

pub use error::{Error, Result};
pub use parcel::{Parcel, Reader};
pub use transport::{CallbackEvent, CallbackStatus, Transport, TxHandle};
pub use service_manager::{Connection, ServiceManager};

/// Re-export of common types for easier use
pub mod prelude {
    pub use crate::{
        CallbackEvent, CallbackStatus, Connection, Error, Parcel, Reader, Result,
        ServiceManager, Transport, TxHandle,
    };
}
