//! IMS adapters exposed to the host telephony daemon.
//!
//! One set per modem slot: registration state machine, live-call tracking,
//! and SMS send/receive, all built on the radio-extension correlator (and
//! its secondary raw-radio path) below.
//!
//! PROPER LAYER SEPARATION:
//! ext-core -> radio-ext -> binder

pub mod api;
mod ids;
pub mod registration;
pub mod call;
pub mod sms;

pub use api::{
    CallExt, ImsRegistrationExt, ImsResult, RegistrationState, SmsExt, IMS_INTERFACE_VERSION,
    CALL_INTERFACE_VERSION, SMS_INTERFACE_VERSION,
};
pub use call::{CallRecord, CallState, Clir, ImsCall};
pub use registration::ImsRegistration;
pub use sms::ImsSms;

/// Re-export of common types for easier use
pub mod prelude {
    pub use crate::api::*;
    pub use crate::{CallRecord, CallState, Clir, ImsCall, ImsRegistration, ImsSms};
}
