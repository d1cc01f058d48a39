use mtkims_binder::loopback::{LoopbackHandle, LoopbackServiceManager};
use mtkims_binder::Parcel;
use mtkims_radio_ext::{RadioExt, MTK_RADIO};

/// Bring up a correlator over an in-memory service and hand back the
/// script-side handle for it.
pub async fn connect_radio(slot: &str) -> (RadioExt, LoopbackHandle) {
    let sm = LoopbackServiceManager::new();
    let radio = RadioExt::connect(&sm, slot).await.expect("connect");
    let handle = sm
        .handle(&format!("{}/{}", MTK_RADIO, slot))
        .expect("service registered");
    (radio, handle)
}

/// Build the payload of a single-status-word response.
pub fn result_response(serial: u32, result: i32) -> Parcel {
    let mut p = Parcel::new();
    p.write_u32(serial);
    p.write_i32(result);
    p
}
