//! IMS registration adapter.
//!
//! A small state machine fed exclusively by the registration-status
//! indication; the host reads the state on demand and hears about it only
//! when it actually changes.

use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use tracing::{debug, warn};

use mtkims_radio_ext::{
    HandlerId, Handlers, ImsFeatureType, ImsRegStatusInfo, IsLast, NetworkType, RadioExt,
    RegStatusReportType,
};

use crate::api::{ImsRegistrationExt, ImsResult, RegistrationState, ResultFn, StateHandlerFn};

struct Inner {
    slot: String,
    radio: RadioExt,
    state: Mutex<RegistrationState>,
    handlers: Handlers<RegistrationState>,
}

/// Host-visible IMS registration interface of one slot.
pub struct ImsRegistration {
    inner: Arc<Inner>,
}

impl ImsRegistration {
    pub fn new(slot: &str, radio: &RadioExt) -> Self {
        let inner = Arc::new(Inner {
            slot: slot.to_owned(),
            radio: radio.clone(),
            state: Mutex::new(RegistrationState::NotRegistered),
            handlers: Handlers::new(),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        radio.add_reg_status_handler(move |info| {
            if let Some(inner) = weak.upgrade() {
                Inner::on_reg_status(&inner, info);
            }
        });

        Self { inner }
    }
}

impl Inner {
    fn on_reg_status(inner: &Arc<Inner>, info: &ImsRegStatusInfo) {
        let state = match info.status() {
            RegStatusReportType::Registering => RegistrationState::Registering,
            RegStatusReportType::Registered => RegistrationState::Registered,
            RegStatusReportType::RegisterFail => RegistrationState::NotRegistered,
            RegStatusReportType::Other(raw) => {
                warn!("[{}] unrecognized registration report {}", inner.slot, raw);
                RegistrationState::Unknown
            }
        };

        let changed = {
            let mut current = inner.state.lock().unwrap();
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        };
        if changed {
            debug!("[{}] registration state {:?}", inner.slot, state);
            inner.handlers.emit(&state);
        }
    }
}

#[async_trait]
impl ImsRegistrationExt for ImsRegistration {
    fn state(&self) -> RegistrationState {
        let state = *self.inner.state.lock().unwrap();
        debug!("[{}] ims_state={:?}", self.inner.slot, state);
        state
    }

    async fn set_registration(&self, on: bool, complete: Option<ResultFn>) -> u32 {
        let inner = &self.inner;
        debug!("[{}] set_registration {}", inner.slot, on);

        // Feature configuration ahead of the enable request. Both are
        // fire-and-forget: their completions are ignored, and the enable
        // request is issued without waiting for them to land (see
        // DESIGN.md).
        inner
            .radio
            .set_ims_cfg_feature_value(
                ImsFeatureType::VoiceOverLte,
                NetworkType::Lte,
                on as u32,
                IsLast::Null,
                |_| {},
            )
            .await;
        inner.radio.set_ims_cfg(on, on, on, on, on, on, |_| {}).await;

        // The enable request is what the caller observes.
        inner
            .radio
            .set_ims_enabled(on, move |result| {
                if let Some(complete) = complete {
                    complete(if result == 0 { ImsResult::Ok } else { ImsResult::Error });
                }
            })
            .await
    }

    fn cancel(&self, id: u32) {
        // Cancellation of a pending set_registration is not wired through
        // the correlator; the id is only logged. See DESIGN.md.
        debug!("[{}] cancel {}", self.inner.slot, id);
    }

    fn add_state_handler(&self, handler: StateHandlerFn) -> HandlerId {
        debug!("[{}] add state handler", self.inner.slot);
        self.inner.handlers.add(move |state| handler(*state))
    }

    fn remove_handler(&self, id: HandlerId) -> bool {
        self.inner.handlers.remove(id)
    }
}
