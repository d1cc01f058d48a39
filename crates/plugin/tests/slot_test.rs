use std::sync::{Arc, Mutex};

use mtkims_binder::loopback::LoopbackServiceManager;
use mtkims_binder::Reader;
use mtkims_binder::Transport;
use mtkims_ext_core::prelude::*;
use mtkims_plugin::{
    plugin_init, ExtensionRegistry, Interface, InterfaceKind, Ip4Config, Slot, SlotDriver,
    PLUGIN_NAME,
};
use mtkims_radio_ext::aosp::RADIO_IFACE;
use mtkims_radio_ext::{ImsRadioInd, ImsRadioResp, MtkRadioReq, MTK_RADIO};

#[tokio::test]
async fn slot_connects_both_services_with_handshakes() {
    let sm = LoopbackServiceManager::new();
    let slot = Slot::create(&sm, 0).await.expect("slot");
    assert_eq!(slot.name(), "imsSlot1");

    let vendor = sm.handle(&format!("{}/imsSlot1", MTK_RADIO)).expect("vendor service");
    let raw = sm.handle(&format!("{}/imsAospSlot1", RADIO_IFACE)).expect("raw service");

    // One registration handshake went out on each connection.
    assert_eq!(vendor.transport.sync_sent().len(), 1);
    assert_eq!(raw.transport.sync_sent().len(), 1);
    assert_eq!(
        vendor.transport.sync_sent()[0].0,
        MtkRadioReq::SetResponseFunctionsIms as i32
    );
}

#[tokio::test]
async fn second_slot_gets_its_own_services() {
    let sm = LoopbackServiceManager::new();
    let _slot1 = Slot::create(&sm, 0).await.expect("slot1");
    let _slot2 = Slot::create(&sm, 1).await.expect("slot2");
    assert!(sm.handle(&format!("{}/imsSlot2", MTK_RADIO)).is_some());
    assert!(sm.handle(&format!("{}/imsAospSlot2", RADIO_IFACE)).is_some());
}

#[tokio::test]
async fn interface_lookup_returns_live_adapters() {
    let sm = LoopbackServiceManager::new();
    let slot = Slot::create(&sm, 0).await.expect("slot");

    let Interface::Ims(ims) = slot.get_interface(InterfaceKind::Ims) else {
        panic!("expected ims interface");
    };
    assert_eq!(ims.state(), RegistrationState::NotRegistered);
    assert_eq!(ims.version(), IMS_INTERFACE_VERSION);

    let Interface::Call(call) = slot.get_interface(InterfaceKind::Call) else {
        panic!("expected call interface");
    };
    assert!(call.calls().is_empty());
    assert_ne!(call.flags() & INTERFACE_FLAG_IMS_SUPPORT, 0);
    assert_ne!(call.flags() & INTERFACE_FLAG_IMS_REQUIRED, 0);

    let Interface::Sms(sms) = slot.get_interface(InterfaceKind::Sms) else {
        panic!("expected sms interface");
    };
    assert_eq!(sms.version(), SMS_INTERFACE_VERSION);
}

#[tokio::test]
async fn adapters_are_wired_to_the_slots_correlator() {
    let sm = LoopbackServiceManager::new();
    let slot = Slot::create(&sm, 0).await.expect("slot");
    let vendor = sm.handle(&format!("{}/imsSlot1", MTK_RADIO)).unwrap();

    let states = Arc::new(Mutex::new(Vec::new()));
    let s = states.clone();
    slot.ims().add_state_handler(Box::new(move |state| s.lock().unwrap().push(state)));

    let mut p = mtkims_binder::Parcel::new();
    p.write_u32(1); // registered
    p.write_u32(1);
    p.write_u32(600000);
    p.write_u32(0);
    p.write_string("sip:user@ims");
    p.write_string("");
    vendor.injector.indication(ImsRadioInd::ImsRegStatusReport as i32, p).await;

    assert_eq!(states.lock().unwrap().as_slice(), &[RegistrationState::Registered]);
    assert_eq!(slot.ims().state(), RegistrationState::Registered);
}

#[tokio::test]
async fn shutdown_releases_pending_work_and_is_idempotent() {
    let sm = LoopbackServiceManager::new();
    let slot = Slot::create(&sm, 0).await.expect("slot");
    let vendor = sm.handle(&format!("{}/imsSlot1", MTK_RADIO)).unwrap();

    let outcome = Arc::new(Mutex::new(None));
    let o = outcome.clone();
    let id = slot
        .ims()
        .set_registration(true, Some(Box::new(move |r| *o.lock().unwrap() = Some(r))))
        .await;
    assert_ne!(id, 0);

    slot.shutdown().await;
    slot.shutdown().await;

    assert!(vendor.transport.is_closed());
    // The pending enable was released without completing.
    assert_eq!(*outcome.lock().unwrap(), None);
    assert_eq!(
        vendor
            .injector
            .response(ImsRadioResp::SetImsEnabled as i32, {
                let mut p = mtkims_binder::Parcel::new();
                p.write_u32(id);
                p.write_i32(0);
                p
            })
            .await,
        mtkims_binder::CallbackStatus::Failed
    );
}

#[tokio::test]
async fn ip4_snapshots_are_pushed_to_the_modem() {
    let sm = LoopbackServiceManager::new();
    let slot = Slot::create(&sm, 0).await.expect("slot");
    let vendor = sm.handle(&format!("{}/imsSlot1", MTK_RADIO)).unwrap();

    let cfg = Ip4Config {
        address: Some("192.168.1.17".into()),
        prefix_len: 24,
        gateway: Some("192.168.1.1".into()),
        dns: vec!["8.8.8.8".into(), "1.1.1.1".into()],
    };
    slot.push_ip4_config("wlan0", &cfg).await;

    let sent = vendor.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].code, MtkRadioReq::SetWifiIpAddress as i32);
    let mut reader = Reader::new(sent[0].data.clone());
    let serial = reader.read_u32().unwrap();
    assert_ne!(serial, 0);
    assert_eq!(reader.read_string().unwrap(), "wlan0");
    assert_eq!(reader.read_string().unwrap(), "192.168.1.17");
    assert_eq!(reader.read_u32().unwrap(), 24);
    assert_eq!(reader.read_string().unwrap(), "192.168.1.1");
    assert_eq!(reader.read_u32().unwrap(), 2);
    assert_eq!(reader.read_string().unwrap(), "8.8.8.8, 1.1.1.1");
}

#[tokio::test]
async fn plugin_entry_points_register_and_unregister_the_driver() {
    let registry = ExtensionRegistry::new();
    plugin_init(&registry).expect("init");
    assert!(registry.driver(PLUGIN_NAME).is_some());

    let sm = LoopbackServiceManager::new();
    let driver = registry.driver(PLUGIN_NAME).unwrap();
    let slot = driver.create_slot(&sm, 0).await.expect("slot via driver");
    assert_eq!(slot.name(), "imsSlot1");

    mtkims_plugin::plugin_exit(&registry);
    assert!(registry.driver(PLUGIN_NAME).is_none());
}
