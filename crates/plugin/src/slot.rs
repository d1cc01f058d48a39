//! Per-slot wiring.
//!
//! One correlator, one raw-radio client and the three IMS adapters per
//! modem slot. The vendor service exposes the IMS objects under
//! `imsSlot<N>`; the standard radio envelope of the same slot answers as
//! `imsAospSlot<N>`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use mtkims_binder::ServiceManager;
use mtkims_ext_core::{CallExt, ImsCall, ImsRegistration, ImsRegistrationExt, ImsSms, SmsExt};
use mtkims_radio_ext::aosp::RadioClient;
use mtkims_radio_ext::RadioExt;

use crate::error::Result;
use crate::netwatch::Ip4Config;

/// Capability sets a slot can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Ims,
    Call,
    Sms,
}

/// A resolved per-slot capability interface.
#[derive(Clone)]
pub enum Interface {
    Ims(Arc<dyn ImsRegistrationExt>),
    Call(Arc<dyn CallExt>),
    Sms(Arc<dyn SmsExt>),
}

struct Inner {
    name: String,
    radio: RadioExt,
    aosp: RadioClient,
    ims: Arc<ImsRegistration>,
    call: Arc<ImsCall>,
    sms: Arc<ImsSms>,
}

/// One modem slot's worth of IMS extension objects.
#[derive(Clone)]
pub struct Slot {
    inner: Arc<Inner>,
}

impl Slot {
    /// Bring up the slot: resolve both services, run the endpoint
    /// handshakes and wire the adapters together.
    pub async fn create(sm: &dyn ServiceManager, slot_index: u32) -> Result<Self> {
        let name = format!("imsSlot{}", slot_index + 1);
        let aosp_name = format!("imsAospSlot{}", slot_index + 1);

        let radio = RadioExt::connect(sm, &name).await?;
        let aosp = RadioClient::connect(sm, &aosp_name).await?;

        let ims = Arc::new(ImsRegistration::new(&name, &radio));
        let call = Arc::new(ImsCall::new(&radio, &aosp));
        let sms = Arc::new(ImsSms::new(&radio, &aosp));

        debug!("slot {} up", name);
        Ok(Self { inner: Arc::new(Inner { name, radio, aosp, ims, call, sms }) })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn radio(&self) -> &RadioExt {
        &self.inner.radio
    }

    /// Host-side per-slot interface lookup.
    pub fn get_interface(&self, kind: InterfaceKind) -> Interface {
        match kind {
            InterfaceKind::Ims => Interface::Ims(self.inner.ims.clone()),
            InterfaceKind::Call => Interface::Call(self.inner.call.clone()),
            InterfaceKind::Sms => Interface::Sms(self.inner.sms.clone()),
        }
    }

    pub fn ims(&self) -> Arc<dyn ImsRegistrationExt> {
        self.inner.ims.clone()
    }

    pub fn call(&self) -> Arc<dyn CallExt> {
        self.inner.call.clone()
    }

    pub fn sms(&self) -> Arc<dyn SmsExt> {
        self.inner.sms.clone()
    }

    /// Push one IPv4 snapshot to the modem.
    pub async fn push_ip4_config(&self, iface: &str, cfg: &Ip4Config) {
        let dns = cfg.dns_string();
        self.inner
            .radio
            .set_wifi_ip_address(
                iface,
                cfg.address.as_deref().unwrap_or(""),
                cfg.prefix_len,
                cfg.gateway.as_deref().unwrap_or(""),
                cfg.dns.len() as u32,
                &dns,
            )
            .await;
    }

    /// Consume a watcher's snapshot stream, re-pushing the Wi-Fi IP
    /// configuration on every change.
    pub fn attach_ip4_updates(&self, iface: String, mut updates: mpsc::Receiver<Ip4Config>) {
        let slot = self.clone();
        tokio::spawn(async move {
            slot.inner.radio.set_wifi_enabled(&iface, true).await;
            slot.inner.radio.set_wifi_associated(&iface, true).await;
            while let Some(cfg) = updates.recv().await {
                debug!("slot {} pushing ip config for {}", slot.inner.name, iface);
                slot.push_ip4_config(&iface, &cfg).await;
            }
        });
    }

    /// Tear both clients down. Outstanding requests are released without
    /// completing; safe to call more than once.
    pub async fn shutdown(&self) {
        debug!("slot {} shutting down", self.inner.name);
        self.inner.radio.teardown().await;
        self.inner.aosp.teardown().await;
    }
}
