use mtkims_binder::loopback::{LoopbackHandle, LoopbackServiceManager};
use mtkims_binder::Parcel;
use mtkims_radio_ext::aosp::{RadioClient, RADIO_IFACE};
use mtkims_radio_ext::{RadioExt, MTK_RADIO};

/// One slot's worth of wiring over in-memory services: the vendor
/// radio-extension client plus the raw AOSP client, with the script-side
/// handles for both.
pub struct Harness {
    pub radio: RadioExt,
    pub aosp: RadioClient,
    pub vendor: LoopbackHandle,
    pub raw: LoopbackHandle,
}

pub async fn bring_up(slot: &str, aosp_slot: &str) -> Harness {
    let sm = LoopbackServiceManager::new();
    let radio = RadioExt::connect(&sm, slot).await.expect("vendor connect");
    let aosp = RadioClient::connect(&sm, aosp_slot).await.expect("aosp connect");
    let vendor = sm.handle(&format!("{}/{}", MTK_RADIO, slot)).expect("vendor handle");
    let raw = sm.handle(&format!("{}/{}", RADIO_IFACE, aosp_slot)).expect("raw handle");
    Harness { radio, aosp, vendor, raw }
}

/// Single-status-word response payload on the vendor path.
pub fn result_response(serial: u32, result: i32) -> Parcel {
    let mut p = Parcel::new();
    p.write_u32(serial);
    p.write_i32(result);
    p
}

/// `RadioResponseInfo` envelope on the raw path.
pub fn radio_envelope(serial: u32, error: i32) -> Parcel {
    let mut p = Parcel::new();
    p.write_i32(0); // solicited
    p.write_u32(serial);
    p.write_i32(error);
    p
}

/// `imsRegStatusReport` payload.
pub fn reg_status(report_type: u32) -> Parcel {
    let mut p = Parcel::new();
    p.write_u32(report_type);
    p.write_u32(1);
    p.write_u32(600000);
    p.write_u32(0);
    p.write_string("sip:+15550100@ims.example.org");
    p.write_string("");
    p
}

/// `callInfoIndication` payload.
pub fn call_info(call_id: u32, msg_type: u32, number: &str) -> Parcel {
    let mut p = Parcel::new();
    p.write_u32(call_id);
    p.write_u32(msg_type);
    p.write_u32(0);
    p.write_string(number);
    p
}
