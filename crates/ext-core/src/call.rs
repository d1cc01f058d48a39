//! Voice call adapter.
//!
//! Tracks the live calls of one slot as reported by call-info indications
//! and carries dial out through the raw radio path. Most call control is
//! still a stub returning a failure handle; the gap is deliberate and
//! host-visible rather than papered over.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use tracing::{debug, trace};

use mtkims_radio_ext::aosp::{RadioClient, RadioReq, RadioResp};
pub use mtkims_radio_ext::aosp::Clir;
use mtkims_radio_ext::{CallInfo, CallInfoMsgType, HandlerId, Handlers, RadioExt, ReleaseFn};

use crate::api::{
    CallExt, CallsChangedFn, DisconnectFn, ImsResult, ResultFn, RingFn,
};
use crate::ids::alloc_local_id;

/// State of one live call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Incoming,
    Alerting,
    Active,
    Holding,
    Waiting,
    /// Sentinel: emitted once, the record is removed alongside it.
    Disconnected,
}

impl CallState {
    /// Fixed mapping from the indication message type. Anything outside the
    /// table (including the MO-call-id-assign bookkeeping message) yields
    /// `None` and the indication is dropped entirely.
    pub fn from_msg_type(raw: u32) -> Option<CallState> {
        Some(match CallInfoMsgType::from_raw(raw)? {
            CallInfoMsgType::Setup => CallState::Incoming,
            CallInfoMsgType::Alert => CallState::Alerting,
            CallInfoMsgType::Connected => CallState::Active,
            CallInfoMsgType::Active => CallState::Active,
            CallInfoMsgType::Held => CallState::Holding,
            CallInfoMsgType::RemoteHold => CallState::Waiting,
            CallInfoMsgType::RemoteResume => CallState::Active,
            CallInfoMsgType::Disconnected => CallState::Disconnected,
            CallInfoMsgType::MoCallIdAssign => return None,
        })
    }
}

/// One live call as observed through indications.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub id: u32,
    pub state: CallState,
    pub number: String,
    pub ims: bool,
    pub incoming: bool,
}

struct Inner {
    radio: RadioExt,
    aosp: RadioClient,
    calls: Mutex<Vec<CallRecord>>,
    /// Host-visible operation id → underlying raw-radio serial.
    id_map: Arc<Mutex<HashMap<u32, u32>>>,
    calls_changed: Handlers<()>,
    disconnected: Handlers<(u32, String)>,
    ring: Handlers<()>,
}

/// Host-visible call interface of one slot.
pub struct ImsCall {
    inner: Arc<Inner>,
}

impl ImsCall {
    pub fn new(radio: &RadioExt, aosp: &RadioClient) -> Self {
        let inner = Arc::new(Inner {
            radio: radio.clone(),
            aosp: aosp.clone(),
            calls: Mutex::new(Vec::new()),
            id_map: Arc::new(Mutex::new(HashMap::new())),
            calls_changed: Handlers::new(),
            disconnected: Handlers::new(),
            ring: Handlers::new(),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        radio.add_call_info_handler(move |info| {
            if let Some(inner) = weak.upgrade() {
                Inner::handle_call_info(&inner, info);
            }
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        radio.add_ring_handler(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.ring.emit(&());
            }
        });

        Self { inner }
    }
}

impl Inner {
    fn handle_call_info(inner: &Arc<Inner>, info: &CallInfo) {
        let Some(state) = CallState::from_msg_type(info.msg_type) else {
            trace!("ignoring call info msg_type {} for call {}", info.msg_type, info.call_id);
            return;
        };

        if state == CallState::Disconnected {
            let known = inner.calls.lock().unwrap().iter().any(|call| call.id == info.call_id);
            if !known {
                trace!("disconnect for unknown call {}", info.call_id);
                return;
            }
            // Disconnect event first, record removal in between, list
            // change last, so getters stay consistent with whichever event
            // the host is handling.
            inner.disconnected.emit(&(info.call_id, String::new()));
            inner.calls.lock().unwrap().retain(|call| call.id != info.call_id);
            inner.calls_changed.emit(&());
            return;
        }

        {
            let mut calls = inner.calls.lock().unwrap();
            match calls.iter_mut().find(|call| call.id == info.call_id) {
                Some(call) => {
                    call.state = state;
                    if !info.number.is_empty() {
                        call.number = info.number.clone();
                    }
                }
                None => calls.push(CallRecord {
                    id: info.call_id,
                    state,
                    number: info.number.clone(),
                    ims: true,
                    incoming: state == CallState::Incoming,
                }),
            }
        }
        inner.calls_changed.emit(&());
    }
}

#[async_trait]
impl CallExt for ImsCall {
    fn calls(&self) -> Vec<CallRecord> {
        self.inner.calls.lock().unwrap().clone()
    }

    async fn dial(&self, number: &str, clir: Clir, complete: Option<ResultFn>) -> u32 {
        let inner = &self.inner;
        debug!("dial {}", number);

        let local_id = alloc_local_id(&inner.id_map);
        inner.id_map.lock().unwrap().insert(local_id, 0);

        let id_map = inner.id_map.clone();
        let release: ReleaseFn = Box::new(move || {
            id_map.lock().unwrap().remove(&local_id);
        });

        let number = number.to_owned();
        let underlying = inner
            .aosp
            .submit(
                RadioReq::Dial,
                RadioResp::Dial,
                move |p| {
                    p.write_string(&number);
                    p.write_i32(clir as i32);
                    p.write_u32(0); // no UUS info
                },
                move |error| {
                    if let Some(complete) = complete {
                        complete(if error == 0 { ImsResult::Ok } else { ImsResult::Error });
                    }
                },
                Some(release),
            )
            .await;

        if underlying == 0 {
            inner.id_map.lock().unwrap().remove(&local_id);
            return 0;
        }
        if let Some(mapped) = inner.id_map.lock().unwrap().get_mut(&local_id) {
            *mapped = underlying;
        }
        local_id
    }

    async fn answer(&self, _complete: Option<ResultFn>) -> u32 {
        debug!("answer is not implemented yet");
        0
    }

    async fn swap(&self, _complete: Option<ResultFn>) -> u32 {
        debug!("swap is not implemented yet");
        0
    }

    async fn hangup(&self, _call_id: u32, _complete: Option<ResultFn>) -> u32 {
        debug!("hangup is not implemented yet");
        0
    }

    async fn conference(&self, _complete: Option<ResultFn>) -> u32 {
        debug!("conference is not implemented yet");
        0
    }

    async fn send_dtmf(&self, _tones: &str, _complete: Option<ResultFn>) -> u32 {
        debug!("send_dtmf is not implemented yet");
        0
    }

    fn cancel(&self, id: u32) {
        let mapped = self.inner.id_map.lock().unwrap().get(&id).copied();
        self.inner.aosp.cancel(mapped.unwrap_or(id));
    }

    fn add_calls_changed_handler(&self, handler: CallsChangedFn) -> HandlerId {
        self.inner.calls_changed.add(move |_| handler())
    }

    fn add_disconnect_handler(&self, handler: DisconnectFn) -> HandlerId {
        self.inner.disconnected.add(move |(call_id, reason)| handler(*call_id, reason))
    }

    fn add_ring_handler(&self, handler: RingFn) -> HandlerId {
        self.inner.ring.add(move |_| handler())
    }

    fn remove_handler(&self, id: HandlerId) -> bool {
        self.inner.calls_changed.remove(id)
            || self.inner.disconnected.remove(id)
            || self.inner.ring.remove(id)
    }
}
