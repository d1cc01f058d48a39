mod common;

use std::sync::{Arc, Mutex};

use mtkims_binder::{CallbackStatus, Reader};
use mtkims_ext_core::prelude::*;
use mtkims_radio_ext::aosp::{RadioReq, RadioResp};
use mtkims_radio_ext::prelude::*;

use common::{bring_up, call_info, radio_envelope};

const SETUP: u32 = 0;
const ALERT: u32 = 2;
const DISCONNECTED: u32 = 133;

#[tokio::test]
async fn setup_indication_creates_an_incoming_call_record() {
    let h = bring_up("imsSlot1", "imsAospSlot1").await;
    let call = ImsCall::new(&h.radio, &h.aosp);

    h.vendor
        .injector
        .indication(ImsRadioInd::CallInfoIndication as i32, call_info(5, SETUP, "+15550123"))
        .await;

    let calls = call.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, 5);
    assert_eq!(calls[0].state, CallState::Incoming);
    assert_eq!(calls[0].number, "+15550123");
    assert!(calls[0].ims);
    assert!(calls[0].incoming);
}

#[tokio::test]
async fn later_indications_update_the_record_in_place() {
    let h = bring_up("imsSlot1", "imsAospSlot1").await;
    let call = ImsCall::new(&h.radio, &h.aosp);

    h.vendor
        .injector
        .indication(ImsRadioInd::CallInfoIndication as i32, call_info(5, SETUP, "+15550123"))
        .await;
    h.vendor
        .injector
        .indication(ImsRadioInd::CallInfoIndication as i32, call_info(5, ALERT, ""))
        .await;

    let calls = call.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].state, CallState::Alerting);
    // Empty number on an update does not wipe the stored one.
    assert_eq!(calls[0].number, "+15550123");
}

#[tokio::test]
async fn disconnect_emits_disconnect_then_calls_changed_and_removes_the_record() {
    let h = bring_up("imsSlot1", "imsAospSlot1").await;
    let call = Arc::new(ImsCall::new(&h.radio, &h.aosp));

    // Ordered event log: every entry also snapshots the list length the
    // host would observe from inside that event.
    let log: Arc<Mutex<Vec<(String, usize)>>> = Arc::new(Mutex::new(Vec::new()));

    let (l, c) = (log.clone(), call.clone());
    call.add_calls_changed_handler(Box::new(move || {
        l.lock().unwrap().push(("calls_changed".into(), c.calls().len()));
    }));
    let (l, c) = (log.clone(), call.clone());
    call.add_disconnect_handler(Box::new(move |call_id, reason| {
        assert_eq!(reason, "");
        l.lock().unwrap().push((format!("disconnected:{}", call_id), c.calls().len()));
    }));

    h.vendor
        .injector
        .indication(ImsRadioInd::CallInfoIndication as i32, call_info(5, SETUP, "+15550123"))
        .await;
    h.vendor
        .injector
        .indication(ImsRadioInd::CallInfoIndication as i32, call_info(5, DISCONNECTED, ""))
        .await;

    assert!(call.calls().is_empty());
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[
            ("calls_changed".to_string(), 1),
            // Disconnect is observed while the record still exists...
            ("disconnected:5".to_string(), 1),
            // ...and the list change lands after its removal.
            ("calls_changed".to_string(), 0),
        ]
    );
}

#[tokio::test]
async fn disconnect_happens_exactly_once_per_call() {
    let h = bring_up("imsSlot1", "imsAospSlot1").await;
    let call = Arc::new(ImsCall::new(&h.radio, &h.aosp));

    let disconnects = Arc::new(Mutex::new(0u32));
    let d = disconnects.clone();
    call.add_disconnect_handler(Box::new(move |_, _| *d.lock().unwrap() += 1));

    h.vendor
        .injector
        .indication(ImsRadioInd::CallInfoIndication as i32, call_info(7, SETUP, ""))
        .await;
    h.vendor
        .injector
        .indication(ImsRadioInd::CallInfoIndication as i32, call_info(7, DISCONNECTED, ""))
        .await;
    // A stray disconnect for a call that is already gone is dropped.
    h.vendor
        .injector
        .indication(ImsRadioInd::CallInfoIndication as i32, call_info(7, DISCONNECTED, ""))
        .await;
    assert_eq!(*disconnects.lock().unwrap(), 1);
    assert!(call.calls().is_empty());
}

#[tokio::test]
async fn unrecognized_message_types_are_dropped_entirely() {
    let h = bring_up("imsSlot1", "imsAospSlot1").await;
    let call = Arc::new(ImsCall::new(&h.radio, &h.aosp));

    let changes = Arc::new(Mutex::new(0u32));
    let c = changes.clone();
    call.add_calls_changed_handler(Box::new(move || *c.lock().unwrap() += 1));

    // MO-call-id-assign bookkeeping and an out-of-table value.
    h.vendor
        .injector
        .indication(ImsRadioInd::CallInfoIndication as i32, call_info(5, 130, ""))
        .await;
    h.vendor
        .injector
        .indication(ImsRadioInd::CallInfoIndication as i32, call_info(5, 999, ""))
        .await;

    assert!(call.calls().is_empty());
    assert_eq!(*changes.lock().unwrap(), 0);
}

#[tokio::test]
async fn dial_goes_out_on_the_raw_radio_path() {
    let h = bring_up("imsSlot1", "imsAospSlot1").await;
    let call = ImsCall::new(&h.radio, &h.aosp);

    let outcome = Arc::new(Mutex::new(None));
    let o = outcome.clone();
    let id = call
        .dial("+15550123", Clir::Invocation, Some(Box::new(move |r| {
            *o.lock().unwrap() = Some(r)
        })))
        .await;
    assert_ne!(id, 0);

    let sent = h.raw.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].code, RadioReq::Dial as i32);
    let mut reader = Reader::new(sent[0].data.clone());
    let serial = reader.read_u32().unwrap();
    assert_eq!(reader.read_string().unwrap(), "+15550123");
    assert_eq!(reader.read_i32().unwrap(), Clir::Invocation as i32);

    h.raw.injector.response(RadioResp::Dial as i32, radio_envelope(serial, 0)).await;
    assert_eq!(*outcome.lock().unwrap(), Some(ImsResult::Ok));
}

#[tokio::test]
async fn cancel_resolves_the_host_id_to_the_underlying_request() {
    let h = bring_up("imsSlot1", "imsAospSlot1").await;
    let call = ImsCall::new(&h.radio, &h.aosp);

    let outcome = Arc::new(Mutex::new(None));
    let o = outcome.clone();
    let id = call
        .dial("+15550123", Clir::Default, Some(Box::new(move |r| {
            *o.lock().unwrap() = Some(r)
        })))
        .await;

    call.cancel(id);
    assert_eq!(h.aosp.pending_requests(), 0);
    assert_eq!(h.raw.transport.cancelled().len(), 1);

    // A late answer finds nothing and the completion stays silent.
    let serial = {
        let sent = h.raw.transport.sent();
        let mut reader = Reader::new(sent[0].data.clone());
        reader.read_u32().unwrap()
    };
    let status = h.raw.injector.response(RadioResp::Dial as i32, radio_envelope(serial, 0)).await;
    assert_eq!(status, CallbackStatus::Failed);
    assert_eq!(*outcome.lock().unwrap(), None);
}

#[tokio::test]
async fn unimplemented_call_controls_return_failure_handles() {
    let h = bring_up("imsSlot1", "imsAospSlot1").await;
    let call = ImsCall::new(&h.radio, &h.aosp);

    assert_eq!(call.answer(None).await, 0);
    assert_eq!(call.swap(None).await, 0);
    assert_eq!(call.hangup(5, None).await, 0);
    assert_eq!(call.conference(None).await, 0);
    assert_eq!(call.send_dtmf("5", None).await, 0);
    // Nothing reached either wire.
    assert!(h.raw.transport.sent().is_empty());
    assert!(h.vendor.transport.sent().is_empty());
}

#[tokio::test]
async fn incoming_call_indication_rings_the_host() {
    let h = bring_up("imsSlot1", "imsAospSlot1").await;
    let call = ImsCall::new(&h.radio, &h.aosp);

    let rings = Arc::new(Mutex::new(0u32));
    let r = rings.clone();
    call.add_ring_handler(Box::new(move || *r.lock().unwrap() += 1));

    let mut p = mtkims_binder::Parcel::new();
    for field in ["3", "+15550100", "0", "0", "7", "", ""] {
        p.write_string(field);
    }
    h.vendor.injector.indication(ImsRadioInd::IncomingCallIndication as i32, p).await;
    assert_eq!(*rings.lock().unwrap(), 1);
}
