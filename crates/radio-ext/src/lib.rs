//! Request/response/indication correlator for the MediaTek radio-extension
//! service.
//!
//! This crate implements the client side of the vendor `IMtkRadioEx`
//! interface: serial allocation, the outstanding-request table, response
//! correlation, the indication dispatch table, and the typed request
//! helpers the IMS adapters are built on. A secondary client bound to the
//! AOSP-standard `IRadio` envelope (used for call dial and SMS send) lives
//! in the `aosp` module.

mod error;
pub mod types;
mod request;
pub mod events;
mod client;
pub mod aosp;

pub use error::{Error, Result};
pub use client::RadioExt;
pub use events::{HandlerId, Handlers};
pub use request::{PendingRequest, ReleaseFn, RequestTable, ResponseFn};
pub use types::{
    CallInfo, CallInfoMsgType, ImsFeatureType, ImsRadioInd, ImsRadioResp, ImsRegStatusInfo,
    IncomingCallMode, IncomingCallNotification, IsLast, MtkRadioReq, NetworkType,
    RegStatusReportType, IMS_CALL_REQUESTS, MTK_RADIO, MTK_RADIO_INDICATION, MTK_RADIO_RESPONSE,
};

/// Re-export of common types for easier use
pub mod prelude {
    pub use crate::aosp::{Clir, RadioClient, RadioReq, RadioResp};
    pub use crate::{
        CallInfo, CallInfoMsgType, Error, HandlerId, ImsFeatureType, ImsRadioInd, ImsRadioResp,
        ImsRegStatusInfo, IncomingCallMode, IncomingCallNotification, IsLast, MtkRadioReq,
        NetworkType, RadioExt, RegStatusReportType, Result, MTK_RADIO, MTK_RADIO_INDICATION,
        MTK_RADIO_RESPONSE,
    };
}
