mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use mtkims_binder::CallbackStatus;
use mtkims_binder::Transport;
use mtkims_radio_ext::prelude::*;
use mtkims_radio_ext::ResponseFn;

use common::{connect_radio, result_response};

#[tokio::test]
async fn serials_are_unique_and_non_zero_while_outstanding() {
    let (radio, _handle) = connect_radio("imsSlot1").await;

    let mut ids = Vec::new();
    for _ in 0..8 {
        let id = radio.set_ims_enabled(true, |_| {}).await;
        assert_ne!(id, 0);
        assert!(!ids.contains(&id), "serial {} reused while outstanding", id);
        ids.push(id);
    }
    assert_eq!(radio.pending_requests(), 8);
}

#[tokio::test]
async fn serial_is_the_first_field_of_the_wire_payload() {
    let (radio, handle) = connect_radio("imsSlot1").await;

    let id = radio.set_ims_enabled(true, |_| {}).await;
    let sent = handle.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].code, MtkRadioReq::SetImsEnabled as i32);

    let mut reader = mtkims_binder::Reader::new(sent[0].data.clone());
    assert_eq!(reader.read_u32().unwrap(), id);
    assert!(reader.read_bool().unwrap());
}

#[tokio::test]
async fn matching_response_completes_and_removes_the_entry() {
    let (radio, handle) = connect_radio("imsSlot1").await;

    let result = Arc::new(Mutex::new(None));
    let r = result.clone();
    let id = radio.set_ims_enabled(true, move |v| *r.lock().unwrap() = Some(v)).await;

    let status = handle
        .injector
        .response(ImsRadioResp::SetImsEnabled as i32, result_response(id, 0))
        .await;
    assert_eq!(status, CallbackStatus::Ok);
    assert_eq!(*result.lock().unwrap(), Some(0));
    assert_eq!(radio.pending_requests(), 0);
}

#[tokio::test]
async fn non_zero_result_is_delivered_as_is() {
    let (radio, handle) = connect_radio("imsSlot1").await;

    let result = Arc::new(Mutex::new(None));
    let r = result.clone();
    let id = radio.set_ims_enabled(true, move |v| *r.lock().unwrap() = Some(v)).await;

    handle
        .injector
        .response(ImsRadioResp::SetImsEnabled as i32, result_response(id, 1))
        .await;
    assert_eq!(*result.lock().unwrap(), Some(1));
}

#[tokio::test]
async fn mismatched_response_code_is_a_protocol_error_and_leaves_the_entry() {
    let (radio, handle) = connect_radio("imsSlot1").await;

    let completions = Arc::new(AtomicU32::new(0));
    let c = completions.clone();
    let id = radio
        .set_ims_enabled(true, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    // Right serial, wrong response code.
    let status = handle
        .injector
        .response(ImsRadioResp::SetImsCfg as i32, result_response(id, 0))
        .await;
    assert_eq!(status, CallbackStatus::Failed);
    assert_eq!(completions.load(Ordering::SeqCst), 0);
    assert_eq!(radio.pending_requests(), 1);

    // The request is left untouched and still completes normally.
    let status = handle
        .injector
        .response(ImsRadioResp::SetImsEnabled as i32, result_response(id, 0))
        .await;
    assert_eq!(status, CallbackStatus::Ok);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_serial_never_mutates_the_table() {
    let (radio, handle) = connect_radio("imsSlot1").await;

    let completions = Arc::new(AtomicU32::new(0));
    let c = completions.clone();
    radio
        .set_ims_enabled(true, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    let status = handle
        .injector
        .response(ImsRadioResp::SetImsEnabled as i32, result_response(9999, 0))
        .await;
    assert_eq!(status, CallbackStatus::Failed);
    assert_eq!(completions.load(Ordering::SeqCst), 0);
    assert_eq!(radio.pending_requests(), 1);
}

#[tokio::test]
async fn zero_serial_is_logged_and_dropped_not_failed() {
    let (radio, handle) = connect_radio("imsSlot1").await;
    radio.set_ims_enabled(true, |_| {}).await;

    let status = handle
        .injector
        .response(ImsRadioResp::SetImsEnabled as i32, result_response(0, 0))
        .await;
    assert_eq!(status, CallbackStatus::Ok);
    assert_eq!(radio.pending_requests(), 1);
}

#[tokio::test]
async fn late_response_for_a_completed_serial_is_unexpected() {
    let (radio, handle) = connect_radio("imsSlot1").await;

    let id = radio.set_ims_enabled(true, |_| {}).await;
    let resp = ImsRadioResp::SetImsEnabled as i32;
    assert_eq!(handle.injector.response(resp, result_response(id, 0)).await, CallbackStatus::Ok);
    // Second arrival for the same serial: the entry is gone.
    assert_eq!(
        handle.injector.response(resp, result_response(id, 0)).await,
        CallbackStatus::Failed
    );
}

#[tokio::test]
async fn responses_complete_out_of_submission_order() {
    let (radio, handle) = connect_radio("imsSlot1").await;

    let order = Arc::new(Mutex::new(Vec::new()));
    let (o1, o2) = (order.clone(), order.clone());
    let first = radio.set_ims_enabled(true, move |_| o1.lock().unwrap().push("first")).await;
    let second = radio.set_ims_cfg(true, true, true, true, true, true, move |_| {
        o2.lock().unwrap().push("second")
    })
    .await;

    handle
        .injector
        .response(ImsRadioResp::SetImsCfg as i32, result_response(second, 0))
        .await;
    handle
        .injector
        .response(ImsRadioResp::SetImsEnabled as i32, result_response(first, 0))
        .await;

    assert_eq!(*order.lock().unwrap(), vec!["second", "first"]);
    assert_eq!(radio.pending_requests(), 0);
}

#[tokio::test]
async fn cancel_is_idempotent_and_never_completes() {
    let (radio, handle) = connect_radio("imsSlot1").await;

    let released = Arc::new(AtomicU32::new(0));
    let rel = released.clone();
    let handler: ResponseFn = Box::new(|_| panic!("completion must not fire"));
    let id = radio
        .submit(
            MtkRadioReq::SetImsEnabled,
            ImsRadioResp::SetImsEnabled,
            |p| {
                p.write_bool(true);
            },
            handler,
            Some(Box::new(move || {
                rel.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .await;
    assert_ne!(id, 0);

    radio.cancel(id);
    radio.cancel(id);
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(radio.pending_requests(), 0);
    // The wire transmission was cancelled best-effort.
    assert_eq!(handle.transport.cancelled().len(), 1);

    // A response for the cancelled serial is now unexpected.
    let status = handle
        .injector
        .response(ImsRadioResp::SetImsEnabled as i32, result_response(id, 0))
        .await;
    assert_eq!(status, CallbackStatus::Failed);
}

#[tokio::test]
async fn reentrant_cancel_from_a_completion_callback_is_a_no_op() {
    let (radio, handle) = connect_radio("imsSlot1").await;

    let own_id = Arc::new(Mutex::new(0u32));
    let completions = Arc::new(AtomicU32::new(0));
    let (radio2, id2, c2) = (radio.clone(), own_id.clone(), completions.clone());
    let id = radio
        .set_ims_enabled(true, move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
            // The entry has already left the table; this must not deadlock
            // or double-release.
            radio2.cancel(*id2.lock().unwrap());
        })
        .await;
    *own_id.lock().unwrap() = id;

    let status = handle
        .injector
        .response(ImsRadioResp::SetImsEnabled as i32, result_response(id, 0))
        .await;
    assert_eq!(status, CallbackStatus::Ok);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(radio.pending_requests(), 0);
}

#[tokio::test]
async fn transmit_failure_returns_zero_and_fires_nothing() {
    let (radio, handle) = connect_radio("imsSlot1").await;
    handle.transport.fail_sends(true);

    let released = Arc::new(AtomicU32::new(0));
    let completed = Arc::new(AtomicU32::new(0));
    let (rel, comp) = (released.clone(), completed.clone());
    let handler: ResponseFn = Box::new(move |_| {
        comp.fetch_add(1, Ordering::SeqCst);
    });
    let id = radio
        .submit(
            MtkRadioReq::SetImsEnabled,
            ImsRadioResp::SetImsEnabled,
            |p| {
                p.write_bool(true);
            },
            handler,
            Some(Box::new(move || {
                rel.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .await;

    assert_eq!(id, 0);
    assert_eq!(radio.pending_requests(), 0);
    assert_eq!(released.load(Ordering::SeqCst), 0);
    assert_eq!(completed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn teardown_releases_outstanding_entries_exactly_once() {
    let (radio, handle) = connect_radio("imsSlot1").await;

    let releases = Arc::new(Mutex::new(Vec::new()));
    let completions = Arc::new(AtomicU32::new(0));
    let mut ids = Vec::new();
    for tag in ["a", "b", "c"] {
        let releases = releases.clone();
        let completions = completions.clone();
        let c = completions.clone();
        let handler: ResponseFn = Box::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let id = radio
            .submit(
                MtkRadioReq::SetImsEnabled,
                ImsRadioResp::SetImsEnabled,
                |p| {
                    p.write_bool(true);
                },
                handler,
                Some(Box::new(move || releases.lock().unwrap().push(tag))),
            )
            .await;
        ids.push(id);
    }

    // Complete "a" normally; its release fires now, not at teardown.
    handle
        .injector
        .response(ImsRadioResp::SetImsEnabled as i32, result_response(ids[0], 0))
        .await;
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(releases.lock().unwrap().as_slice(), &["a"]);

    radio.teardown().await;
    radio.teardown().await; // idempotent

    let mut released = releases.lock().unwrap().clone();
    released.sort();
    assert_eq!(released, vec!["a", "b", "c"]);
    // No completion fired during teardown.
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(radio.pending_requests(), 0);
    assert!(handle.transport.is_closed());
}

#[tokio::test]
async fn submit_after_teardown_fails_immediately() {
    let (radio, _handle) = connect_radio("imsSlot1").await;
    radio.teardown().await;
    assert_eq!(radio.set_ims_enabled(true, |_| {}).await, 0);
    assert_eq!(radio.pending_requests(), 0);
}

#[tokio::test]
async fn handshake_registers_both_callback_endpoints() {
    let (_radio, handle) = connect_radio("imsSlot1").await;

    let sync = handle.transport.sync_sent();
    assert_eq!(sync.len(), 1);
    assert_eq!(sync[0].0, MtkRadioReq::SetResponseFunctionsIms as i32);

    let mut reader = mtkims_binder::Reader::new(sync[0].1.clone());
    assert_eq!(reader.read_string().unwrap(), MTK_RADIO_RESPONSE);
    assert_eq!(reader.read_string().unwrap(), MTK_RADIO_INDICATION);
}
