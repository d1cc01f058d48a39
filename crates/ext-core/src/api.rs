//! Host-facing capability interfaces.
//!
//! The host daemon discovers per-slot capability sets through these traits;
//! each carries a fixed version tag and, where the host cares, a flag word
//! describing the capability (IMS support / IMS required). The shapes
//! mirror the host's interface tables one for one.

use async_trait::async_trait;

use crate::call::{CallRecord, Clir};
pub use mtkims_radio_ext::HandlerId;

pub const IMS_INTERFACE_VERSION: u32 = 1;
pub const CALL_INTERFACE_VERSION: u32 = 1;
pub const SMS_INTERFACE_VERSION: u32 = 1;

/// Capability flag: the interface supports IMS calls/messages.
pub const INTERFACE_FLAG_IMS_SUPPORT: u32 = 0x01;
/// Capability flag: the interface only works over IMS.
pub const INTERFACE_FLAG_IMS_REQUIRED: u32 = 0x02;

/// Outcome reported to the host for an asynchronous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImsResult {
    Ok,
    Error,
}

/// IMS registration state as exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unknown,
    Registering,
    Registered,
    NotRegistered,
}

pub type ResultFn = Box<dyn FnOnce(ImsResult) + Send>;
pub type StateHandlerFn = Box<dyn Fn(RegistrationState) + Send + Sync>;
pub type CallsChangedFn = Box<dyn Fn() + Send + Sync>;
pub type DisconnectFn = Box<dyn Fn(u32, &str) + Send + Sync>;
pub type RingFn = Box<dyn Fn() + Send + Sync>;
pub type PduFn = Box<dyn Fn(&[u8]) + Send + Sync>;
/// Send outcome plus the message reference it applies to.
pub type SmsSendFn = Box<dyn FnOnce(ImsResult, u32) + Send>;

/// Per-slot IMS registration capability.
#[async_trait]
pub trait ImsRegistrationExt: Send + Sync {
    fn version(&self) -> u32 {
        IMS_INTERFACE_VERSION
    }

    /// Current registration state, read on demand.
    fn state(&self) -> RegistrationState;

    /// Switch IMS registration on or off. The returned id identifies the
    /// operation for `cancel`; zero means the request could not be issued
    /// and `complete` will never run.
    async fn set_registration(&self, on: bool, complete: Option<ResultFn>) -> u32;

    fn cancel(&self, id: u32);

    fn add_state_handler(&self, handler: StateHandlerFn) -> HandlerId;
    fn remove_handler(&self, id: HandlerId) -> bool;
}

/// Per-slot voice call capability.
#[async_trait]
pub trait CallExt: Send + Sync {
    fn version(&self) -> u32 {
        CALL_INTERFACE_VERSION
    }

    fn flags(&self) -> u32 {
        INTERFACE_FLAG_IMS_SUPPORT | INTERFACE_FLAG_IMS_REQUIRED
    }

    /// Snapshot of the live calls.
    fn calls(&self) -> Vec<CallRecord>;

    async fn dial(&self, number: &str, clir: Clir, complete: Option<ResultFn>) -> u32;
    async fn answer(&self, complete: Option<ResultFn>) -> u32;
    async fn swap(&self, complete: Option<ResultFn>) -> u32;
    async fn hangup(&self, call_id: u32, complete: Option<ResultFn>) -> u32;
    async fn conference(&self, complete: Option<ResultFn>) -> u32;
    async fn send_dtmf(&self, tones: &str, complete: Option<ResultFn>) -> u32;

    fn cancel(&self, id: u32);

    fn add_calls_changed_handler(&self, handler: CallsChangedFn) -> HandlerId;
    fn add_disconnect_handler(&self, handler: DisconnectFn) -> HandlerId;
    fn add_ring_handler(&self, handler: RingFn) -> HandlerId;
    fn remove_handler(&self, id: HandlerId) -> bool;
}

/// Per-slot SMS capability.
#[async_trait]
pub trait SmsExt: Send + Sync {
    fn version(&self) -> u32 {
        SMS_INTERFACE_VERSION
    }

    fn flags(&self) -> u32 {
        INTERFACE_FLAG_IMS_SUPPORT | INTERFACE_FLAG_IMS_REQUIRED
    }

    /// Submit an outgoing message. A non-zero return only means the send
    /// was queued; the host must wait for `complete`, not re-send on the
    /// strength of the handle.
    async fn send(
        &self,
        smsc: &str,
        pdu: &[u8],
        msg_ref: u32,
        flags: u32,
        complete: Option<SmsSendFn>,
    ) -> u32;

    fn cancel(&self, id: u32);

    fn ack_report(&self, msg_ref: u32, ok: bool);
    fn ack_incoming(&self, ok: bool);

    fn add_report_handler(&self, handler: PduFn) -> HandlerId;
    fn add_incoming_handler(&self, handler: PduFn) -> HandlerId;
    fn remove_handler(&self, id: HandlerId) -> bool;
}
