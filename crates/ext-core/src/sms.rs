//! SMS adapter.
//!
//! Outgoing messages ride the raw radio path with full result tracking:
//! each send owns one entry in an id map, removed atomically on the first
//! of completion or cancellation; whichever loses becomes a no-op.
//! Incoming messages and delivery reports are forwarded from the
//! radio-extension indication signals.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use tracing::debug;

use mtkims_radio_ext::aosp::{RadioClient, RadioReq, RadioResp};
use mtkims_radio_ext::{HandlerId, Handlers, RadioExt, ReleaseFn};

use crate::api::{ImsResult, PduFn, SmsExt, SmsSendFn};
use crate::ids::alloc_local_id;

fn hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        out.push_str(&format!("{:02X}", b));
    }
    out
}

struct Inner {
    radio: RadioExt,
    aosp: RadioClient,
    /// Host-visible send id → underlying raw-radio serial.
    id_map: Arc<Mutex<HashMap<u32, u32>>>,
    incoming: Handlers<Vec<u8>>,
    reports: Handlers<Vec<u8>>,
}

/// Host-visible SMS interface of one slot.
pub struct ImsSms {
    inner: Arc<Inner>,
}

impl ImsSms {
    pub fn new(radio: &RadioExt, aosp: &RadioClient) -> Self {
        let inner = Arc::new(Inner {
            radio: radio.clone(),
            aosp: aosp.clone(),
            id_map: Arc::new(Mutex::new(HashMap::new())),
            incoming: Handlers::new(),
            reports: Handlers::new(),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        radio.add_incoming_sms_handler(move |pdu| {
            if let Some(inner) = weak.upgrade() {
                inner.incoming.emit(pdu);
            }
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        radio.add_sms_status_report_handler(move |pdu| {
            if let Some(inner) = weak.upgrade() {
                inner.reports.emit(pdu);
            }
        });

        Self { inner }
    }
}

#[async_trait]
impl SmsExt for ImsSms {
    async fn send(
        &self,
        smsc: &str,
        pdu: &[u8],
        msg_ref: u32,
        _flags: u32,
        complete: Option<SmsSendFn>,
    ) -> u32 {
        let inner = &self.inner;
        debug!("sending SMS: smsc={}, pdu_len={}, msg_ref={}", smsc, pdu.len(), msg_ref);

        let local_id = alloc_local_id(&inner.id_map);
        inner.id_map.lock().unwrap().insert(local_id, 0);

        let id_map = inner.id_map.clone();
        let release: ReleaseFn = Box::new(move || {
            id_map.lock().unwrap().remove(&local_id);
        });

        let smsc = smsc.to_owned();
        let pdu_hex = hex_encode(pdu);
        let underlying = inner
            .aosp
            .submit(
                RadioReq::SendSms,
                RadioResp::SendSms,
                move |p| {
                    p.write_string(&smsc);
                    p.write_string(&pdu_hex);
                },
                move |error| {
                    if let Some(complete) = complete {
                        complete(
                            if error == 0 { ImsResult::Ok } else { ImsResult::Error },
                            msg_ref,
                        );
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

    fn cancel(&self, id: u32) {
        let mapped = self.inner.id_map.lock().unwrap().get(&id).copied();
        if let Some(mapped) = mapped {
            // The underlying cancel runs the release hook, which clears the
            // id map entry; a completion racing in ahead of us already did
            // both, and this becomes a no-op.
            self.inner.aosp.cancel(mapped);
        }
    }

    fn ack_report(&self, msg_ref: u32, ok: bool) {
        debug!("acknowledging SMS report: msg_ref={}, ok={}", msg_ref, ok);
    }

    fn ack_incoming(&self, ok: bool) {
        debug!("acknowledging incoming SMS: ok={}", ok);
    }

    fn add_report_handler(&self, handler: PduFn) -> HandlerId {
        self.inner.reports.add(move |pdu| handler(pdu))
    }

    fn add_incoming_handler(&self, handler: PduFn) -> HandlerId {
        self.inner.incoming.add(move |pdu| handler(pdu))
    }

    fn remove_handler(&self, id: HandlerId) -> bool {
        self.inner.reports.remove(id) || self.inner.incoming.remove(id)
    }
}
