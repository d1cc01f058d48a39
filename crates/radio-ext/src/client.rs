//! # Radio-extension correlator
//!
//! Client side of the vendor `IMtkRadioEx` service. This module is the
//! correlation engine the whole plugin hangs off:
//!
//! ```text
//! +---------------------------+
//! |  Adapters                 |  <- IMS registration, calls, SMS
//! +---------------------------+
//!              ↑ ↓
//!              | |  typed requests, event signals
//!              ↓ ↑
//! +---------------------------+
//! |  Correlator (this module) |  <- serial allocation, pending table,
//! |                           |     response demux, indication dispatch
//! +---------------------------+
//!              ↑ ↓
//!              | |  one-way parcels, callback events
//!              ↓ ↑
//! +---------------------------+
//! |  Binder transport         |
//! +---------------------------+
//! ```
//!
//! Requests are one-way at the transport level; the remote service answers
//! on a separately registered response endpoint, prefixing each response
//! with the serial the request carried as its first payload field. This
//! layer matches responses strictly by (serial, response code); completion
//! order across distinct requests is unrelated to submission order.
//! Indications arrive on a third endpoint, are never correlated to any
//! request, and fan out through the typed signal registries.
//!
//! Every submitted request completes its lifecycle exactly once: a matched
//! response runs the completion and the release hook; cancellation and
//! teardown run only the release hook. A request that never gets a matching
//! response keeps its table entry until teardown, as there is no per-request
//! expiry (see DESIGN.md).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use mtkims_binder::{
    CallbackEvent, CallbackStatus, Parcel, Reader, ServiceManager, Transport, TxHandle,
};

use crate::error::{Error, Result};
use crate::events::{HandlerId, Handlers};
use crate::request::{Correlation, PendingRequest, ReleaseFn, RequestTable, ResponseFn};
use crate::types::*;

/// Signals fanned out from the indication endpoint.
struct Signals {
    call_info: Handlers<CallInfo>,
    reg_status: Handlers<ImsRegStatusInfo>,
    ring: Handlers<IncomingCallNotification>,
    incoming_sms: Handlers<Vec<u8>>,
    sms_status_report: Handlers<Vec<u8>>,
}

impl Signals {
    fn new() -> Self {
        Self {
            call_info: Handlers::new(),
            reg_status: Handlers::new(),
            ring: Handlers::new(),
            incoming_sms: Handlers::new(),
            sms_status_report: Handlers::new(),
        }
    }
}

struct Inner {
    slot: String,
    transport: Arc<dyn Transport>,
    requests: Mutex<RequestTable>,
    signals: Signals,
    torn_down: AtomicBool,
}

/// Client handle to the radio-extension service of one modem slot.
///
/// Cheap to clone; all clones share the same pending table and signals.
#[derive(Clone)]
pub struct RadioExt {
    inner: Arc<Inner>,
}

impl RadioExt {
    /// Resolve `IMtkRadioEx/<slot>` and register the response/indication
    /// endpoints. The registration handshake is the one synchronous
    /// call-and-wait in this layer; it happens before any asynchronous
    /// traffic is possible.
    pub async fn connect(sm: &dyn ServiceManager, slot: &str) -> Result<Self> {
        let name = format!("{}/{}", MTK_RADIO, slot);
        let connection = sm
            .get_service(&name)
            .await
            .map_err(|_| Error::Unavailable(name.clone()))?;
        debug!("connected to {}", name);

        // IMtkRadioEx::setResponseFunctionsIms. The callback channel of the
        // connection stands in for the local response/indication objects.
        let mut handshake = Parcel::new();
        handshake.write_string(MTK_RADIO_RESPONSE);
        handshake.write_string(MTK_RADIO_INDICATION);
        connection
            .transport
            .transact_sync(MtkRadioReq::SetResponseFunctionsIms as i32, handshake)
            .await
            .map_err(|e| Error::Handshake(e.to_string()))?;
        debug!("[{}] setResponseFunctionsIms done", slot);

        let inner = Arc::new(Inner {
            slot: slot.to_owned(),
            transport: connection.transport,
            requests: Mutex::new(RequestTable::new()),
            signals: Signals::new(),
            torn_down: AtomicBool::new(false),
        });
        Self::spawn_demux(inner.clone(), connection.callbacks);
        Ok(Self { inner })
    }

    pub fn slot(&self) -> &str {
        &self.inner.slot
    }

    /// Number of requests currently awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.inner.requests.lock().unwrap().len()
    }

    /// Submit a request. Allocates a non-zero serial, writes it as the first
    /// payload field, appends the operation arguments, and inserts the
    /// pending entry *before* transmitting so a response cannot race the
    /// table. Returns the serial as an opaque cancellation handle, or 0 if
    /// the transmission could not be queued (in which case neither callback
    /// runs).
    pub async fn submit<W>(
        &self,
        req_code: MtkRadioReq,
        resp_code: ImsRadioResp,
        write_args: W,
        handle_response: ResponseFn,
        on_release: Option<ReleaseFn>,
    ) -> u32
    where
        W: FnOnce(&mut Parcel),
    {
        let inner = &self.inner;
        if inner.torn_down.load(Ordering::SeqCst) {
            return 0;
        }

        let id = {
            let mut table = inner.requests.lock().unwrap();
            let id = table.alloc_id();
            table.insert(PendingRequest::new(id, resp_code as i32, handle_response, on_release));
            id
        };

        let mut parcel = Parcel::new();
        parcel.write_u32(id);
        write_args(&mut parcel);

        match inner.transport.transact(req_code as i32, parcel).await {
            Ok(tx) => {
                trace!("[{}] request {:?} serial {} {}", inner.slot, req_code, id, tx);
                // The entry may already be gone if the response arrived
                // during the send; the handle is stale then and there is
                // nothing left to cancel.
                inner.requests.lock().unwrap().set_tx(id, tx);
                id
            }
            Err(e) => {
                warn!("[{}] failed to submit {:?}: {}", inner.slot, req_code, e);
                // Neither callback fires on a transmit failure.
                drop(inner.requests.lock().unwrap().remove(id));
                0
            }
        }
    }

    /// Submit a request whose response carries a single `i32` status word.
    /// An unparseable status logs a warning and completes with -1.
    pub async fn submit_result_request<W, F>(
        &self,
        req_code: MtkRadioReq,
        resp_code: ImsRadioResp,
        write_args: W,
        complete: F,
    ) -> u32
    where
        W: FnOnce(&mut Parcel),
        F: FnOnce(i32) + Send + 'static,
    {
        let slot = self.inner.slot.clone();
        let handler: ResponseFn = Box::new(move |reader: &mut Reader| {
            let result = match reader.read_i32() {
                Ok(v) => v,
                Err(_) => {
                    warn!("[{}] failed to parse response", slot);
                    -1
                }
            };
            complete(result);
        });
        self.submit(req_code, resp_code, write_args, handler, None).await
    }

    /// Serial-prefixed one-way send with no pending entry. Used for the
    /// requests whose responses the vendor service delivers on the non-IMS
    /// response interface, which this plugin never registers.
    pub async fn send_oneway<W>(&self, req_code: MtkRadioReq, write_args: W) -> u32
    where
        W: FnOnce(&mut Parcel),
    {
        let inner = &self.inner;
        if inner.torn_down.load(Ordering::SeqCst) {
            return 0;
        }
        let id = inner.requests.lock().unwrap().alloc_id();
        let mut parcel = Parcel::new();
        parcel.write_u32(id);
        write_args(&mut parcel);
        match inner.transport.transact(req_code as i32, parcel).await {
            Ok(_) => id,
            Err(e) => {
                warn!("[{}] failed to send {:?}: {}", inner.slot, req_code, e);
                0
            }
        }
    }

    /// Cancel an outstanding request. Removes the entry if it is still
    /// present (no-op otherwise, safe to call twice, and safe to call from
    /// inside a completion callback), cancels the wire transmission
    /// best-effort, and runs the release hook. The completion callback never
    /// fires for a cancelled request.
    pub fn cancel(&self, id: u32) {
        let entry = self.inner.requests.lock().unwrap().remove(id);
        if let Some(entry) = entry {
            trace!("[{}] cancel serial {}", self.inner.slot, id);
            if entry.tx.is_active() {
                self.inner.transport.cancel(entry.tx);
            }
            entry.release();
        }
    }

    /// Tear down the correlator: release every outstanding entry (the
    /// completion callbacks never fire) and close the transport endpoints.
    /// Idempotent.
    pub async fn teardown(&self) {
        let inner = &self.inner;
        if inner.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let entries = inner.requests.lock().unwrap().drain();
        debug!("[{}] teardown, releasing {} request(s)", inner.slot, entries.len());
        for entry in entries {
            if entry.tx.is_active() {
                inner.transport.cancel(entry.tx);
            }
            entry.release();
        }
        if let Err(e) = inner.transport.close().await {
            warn!("[{}] transport close failed: {}", inner.slot, e);
        }
    }

    /*======================================================================*
     * Typed requests
     *======================================================================*/

    /// IMtkRadioEx::setImsEnable
    pub async fn set_ims_enabled<F>(&self, enabled: bool, complete: F) -> u32
    where
        F: FnOnce(i32) + Send + 'static,
    {
        self.submit_result_request(
            MtkRadioReq::SetImsEnabled,
            ImsRadioResp::SetImsEnabled,
            |p| {
                p.write_bool(enabled);
            },
            complete,
        )
        .await
    }

    /// IMtkRadioEx::setImscfg, the bulk feature toggle.
    pub async fn set_ims_cfg<F>(
        &self,
        volte: bool,
        vilte: bool,
        vowifi: bool,
        viwifi: bool,
        sms: bool,
        eims: bool,
        complete: F,
    ) -> u32
    where
        F: FnOnce(i32) + Send + 'static,
    {
        self.submit_result_request(
            MtkRadioReq::SetImsCfg,
            ImsRadioResp::SetImsCfg,
            |p| {
                p.write_bool(volte);
                p.write_bool(vilte);
                p.write_bool(vowifi);
                p.write_bool(viwifi);
                p.write_bool(sms);
                p.write_bool(eims);
            },
            complete,
        )
        .await
    }

    /// IMtkRadioEx::setImsCfgFeatureValue: one feature on one network type.
    pub async fn set_ims_cfg_feature_value<F>(
        &self,
        feature: ImsFeatureType,
        network: NetworkType,
        value: u32,
        is_last: IsLast,
        complete: F,
    ) -> u32
    where
        F: FnOnce(i32) + Send + 'static,
    {
        self.submit_result_request(
            MtkRadioReq::SetImsCfgFeatureValue,
            ImsRadioResp::SetImsCfgFeatureValue,
            |p| {
                p.write_u32(feature as u32);
                p.write_u32(network as u32);
                p.write_u32(value);
                p.write_i32(is_last as i32);
            },
            complete,
        )
        .await
    }

    /// IMtkRadioEx::setCallIndication: answer an incoming-call indication.
    pub async fn set_call_indication<F>(
        &self,
        mode: IncomingCallMode,
        call_id: u32,
        seq_no: u32,
        complete: F,
    ) -> u32
    where
        F: FnOnce(i32) + Send + 'static,
    {
        self.submit_result_request(
            MtkRadioReq::SetCallIndication,
            ImsRadioResp::SetCallIndication,
            |p| {
                p.write_i32(mode as i32);
                p.write_u32(call_id);
                p.write_u32(seq_no);
            },
            complete,
        )
        .await
    }

    /// IMtkRadioEx::hangupAll
    pub async fn hangup_all<F>(&self, complete: F) -> u32
    where
        F: FnOnce(i32) + Send + 'static,
    {
        self.submit_result_request(
            MtkRadioReq::HangupAll,
            ImsRadioResp::HangupAll,
            |_| {},
            complete,
        )
        .await
    }

    /// IMtkRadioEx::sendImsSmsEx. Fire-and-forget: the vendor acknowledges
    /// IMS SMS on the standard radio response interface, not ours.
    pub async fn send_ims_sms(&self, smsc: &str, pdu: &[u8]) -> u32 {
        self.send_oneway(MtkRadioReq::SendImsSmsEx, |p| {
            p.write_string(smsc);
            p.write_bytes(pdu);
        })
        .await
    }

    /// IMtkRadioEx::setWifiEnabled (fire-and-forget)
    pub async fn set_wifi_enabled(&self, iface: &str, enabled: bool) -> u32 {
        self.send_oneway(MtkRadioReq::SetWifiEnabled, |p| {
            p.write_string(iface);
            p.write_bool(enabled);
        })
        .await
    }

    /// IMtkRadioEx::setWifiAssociated (fire-and-forget)
    pub async fn set_wifi_associated(&self, iface: &str, associated: bool) -> u32 {
        self.send_oneway(MtkRadioReq::SetWifiAssociated, |p| {
            p.write_string(iface);
            p.write_bool(associated);
        })
        .await
    }

    /// IMtkRadioEx::setWifiSignalLevel (fire-and-forget)
    pub async fn set_wifi_signal_level(&self, rssi: i32, snr: i32) -> u32 {
        self.send_oneway(MtkRadioReq::SetWifiSignalLevel, |p| {
            p.write_i32(rssi);
            p.write_i32(snr);
        })
        .await
    }

    /// IMtkRadioEx::setWifiIpAddress (fire-and-forget): push the current
    /// Wi-Fi IPv4 configuration to the modem.
    pub async fn set_wifi_ip_address(
        &self,
        iface: &str,
        ipv4: &str,
        prefix_len: u32,
        gateway: &str,
        dns_count: u32,
        dns_servers: &str,
    ) -> u32 {
        self.send_oneway(MtkRadioReq::SetWifiIpAddress, |p| {
            p.write_string(iface);
            p.write_string(ipv4);
            p.write_u32(prefix_len);
            p.write_string(gateway);
            p.write_u32(dns_count);
            p.write_string(dns_servers);
        })
        .await
    }

    /*======================================================================*
     * Event signals
     *======================================================================*/

    pub fn add_call_info_handler(
        &self,
        handler: impl Fn(&CallInfo) + Send + Sync + 'static,
    ) -> HandlerId {
        self.inner.signals.call_info.add(handler)
    }

    pub fn add_reg_status_handler(
        &self,
        handler: impl Fn(&ImsRegStatusInfo) + Send + Sync + 'static,
    ) -> HandlerId {
        self.inner.signals.reg_status.add(handler)
    }

    pub fn add_ring_handler(
        &self,
        handler: impl Fn(&IncomingCallNotification) + Send + Sync + 'static,
    ) -> HandlerId {
        self.inner.signals.ring.add(handler)
    }

    pub fn add_incoming_sms_handler(
        &self,
        handler: impl Fn(&Vec<u8>) + Send + Sync + 'static,
    ) -> HandlerId {
        self.inner.signals.incoming_sms.add(handler)
    }

    pub fn add_sms_status_report_handler(
        &self,
        handler: impl Fn(&Vec<u8>) + Send + Sync + 'static,
    ) -> HandlerId {
        self.inner.signals.sms_status_report.add(handler)
    }

    pub fn remove_call_info_handler(&self, id: HandlerId) -> bool {
        self.inner.signals.call_info.remove(id)
    }

    pub fn remove_reg_status_handler(&self, id: HandlerId) -> bool {
        self.inner.signals.reg_status.remove(id)
    }

    pub fn remove_ring_handler(&self, id: HandlerId) -> bool {
        self.inner.signals.ring.remove(id)
    }

    pub fn remove_incoming_sms_handler(&self, id: HandlerId) -> bool {
        self.inner.signals.incoming_sms.remove(id)
    }

    pub fn remove_sms_status_report_handler(&self, id: HandlerId) -> bool {
        self.inner.signals.sms_status_report.remove(id)
    }

    /*======================================================================*
     * Demultiplexing
     *======================================================================*/

    fn spawn_demux(inner: Arc<Inner>, mut callbacks: mpsc::Receiver<CallbackEvent>) {
        tokio::spawn(async move {
            while let Some(event) = callbacks.recv().await {
                let torn_down = inner.torn_down.load(Ordering::SeqCst);
                match event {
                    CallbackEvent::Response { code, parcel, status } => {
                        let st = if torn_down {
                            CallbackStatus::Failed
                        } else {
                            Self::on_response(&inner, code, parcel)
                        };
                        if let Some(reply) = status {
                            let _ = reply.send(st);
                        }
                    }
                    CallbackEvent::Indication { code, parcel, status } => {
                        let st = if torn_down {
                            CallbackStatus::Failed
                        } else {
                            Self::on_indication(&inner, code, parcel).await
                        };
                        if let Some(reply) = status {
                            let _ = reply.send(st);
                        }
                    }
                }
            }
            trace!("[{}] callback demux loop exited", inner.slot);
        });
    }

    /// Correlate one response from the response endpoint.
    fn on_response(inner: &Arc<Inner>, code: i32, parcel: Parcel) -> CallbackStatus {
        let mut reader = parcel.into_reader();
        let serial = match reader.read_u32() {
            Ok(serial) => serial,
            Err(e) => {
                warn!("[{}] response {} without serial: {}", inner.slot, code, e);
                return CallbackStatus::Ok;
            }
        };
        // Requests are numbered starting at 1; zero is never a valid
        // correlation key.
        if serial == 0 {
            warn!("[{}] dropping response {} with zero serial", inner.slot, code);
            return CallbackStatus::Ok;
        }

        let correlation = inner.requests.lock().unwrap().correlate(serial, code);
        match correlation {
            Correlation::Matched(entry) => {
                trace!("[{}] response {} serial {}", inner.slot, code, serial);
                // The entry has left the table; the completion runs first,
                // the release hook second.
                entry.complete(reader);
                CallbackStatus::Ok
            }
            Correlation::CodeMismatch | Correlation::NotFound => {
                warn!(
                    "[{}] unexpected response {} {}",
                    inner.slot, MTK_RADIO_RESPONSE, code
                );
                CallbackStatus::Failed
            }
        }
    }

    /// Dispatch one unsolicited indication. Unknown and unhandled codes are
    /// logged and acknowledged; a malformed payload is dropped without any
    /// partial state mutation.
    async fn on_indication(inner: &Arc<Inner>, code: i32, parcel: Parcel) -> CallbackStatus {
        let mut reader = parcel.into_reader();
        let Some(ind) = ImsRadioInd::from_code(code as u32) else {
            debug!("[{}] unknown indication {} {}", inner.slot, MTK_RADIO_INDICATION, code);
            return CallbackStatus::Ok;
        };
        match ind {
            ImsRadioInd::CallInfoIndication => match CallInfo::parse(&mut reader) {
                Ok(info) => {
                    trace!(
                        "[{}] callInfoIndication id={} msg_type={} mode={}",
                        inner.slot, info.call_id, info.msg_type, info.call_mode
                    );
                    inner.signals.call_info.emit(&info);
                }
                Err(e) => warn!("[{}] malformed callInfoIndication: {}", inner.slot, e),
            },
            ImsRadioInd::ImsRegStatusReport => match ImsRegStatusInfo::parse(&mut reader) {
                Ok(info) => {
                    trace!(
                        "[{}] imsRegStatusReport type={} error={}",
                        inner.slot, info.report_type, info.error_code
                    );
                    inner.signals.reg_status.emit(&info);
                }
                Err(e) => warn!("[{}] malformed imsRegStatusReport: {}", inner.slot, e),
            },
            ImsRadioInd::IncomingCallIndication => {
                match IncomingCallNotification::parse(&mut reader) {
                    Ok(info) => {
                        debug!(
                            "[{}] incoming call id={} number={}",
                            inner.slot, info.call_id, info.number
                        );
                        inner.signals.ring.emit(&info);
                        Self::ack_incoming_call(inner, &info).await;
                    }
                    Err(e) => warn!("[{}] malformed incomingCallIndication: {}", inner.slot, e),
                }
            }
            ImsRadioInd::NewSmsEx => match reader.read_bytes() {
                Ok(pdu) => {
                    debug!("[{}] incoming SMS, {} byte pdu", inner.slot, pdu.len());
                    inner.signals.incoming_sms.emit(&pdu);
                }
                Err(e) => warn!("[{}] malformed newSmsEx: {}", inner.slot, e),
            },
            ImsRadioInd::NewSmsStatusReportEx => match reader.read_bytes() {
                Ok(pdu) => {
                    debug!("[{}] SMS status report, {} byte pdu", inner.slot, pdu.len());
                    inner.signals.sms_status_report.emit(&pdu);
                }
                Err(e) => warn!("[{}] malformed newSmsStatusReportEx: {}", inner.slot, e),
            },
            other => {
                // Deliberately ignored; the plugin acts on a small subset of
                // what the vendor service pushes.
                debug!("[{}] ignoring indication {}", inner.slot, other.name());
            }
        }
        CallbackStatus::Ok
    }

    /// Tell the service to proceed with an incoming call. The notification
    /// carries its identifiers as decimal strings.
    async fn ack_incoming_call(inner: &Arc<Inner>, info: &IncomingCallNotification) {
        let (Ok(call_id), Ok(seq_no)) =
            (info.call_id.trim().parse::<u32>(), info.seq_no.trim().parse::<u32>())
        else {
            warn!(
                "[{}] unparseable incoming call id/seq '{}'/'{}'",
                inner.slot, info.call_id, info.seq_no
            );
            return;
        };
        let radio = RadioExt { inner: inner.clone() };
        let slot = inner.slot.clone();
        radio
            .set_call_indication(IncomingCallMode::Allow, call_id, seq_no, move |result| {
                if result != 0 {
                    warn!("[{}] setCallIndication failed: {}", slot, result);
                }
            })
            .await;
    }
}
