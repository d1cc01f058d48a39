//! Secondary raw-radio request path.
//!
//! Call dial and SMS send go through a second binder client bound to the
//! AOSP-standard `IRadio` interface of the same slot (`imsAospSlot<N>`),
//! following the standard radio envelope: requests carry a serial as their
//! first field, responses open with a `RadioResponseInfo` (type, serial,
//! error). Correlation works like the vendor path, strictly by
//! (serial, response code), with the same exactly-once completion and
//! cancellation semantics, but completions observe the envelope's error
//! word rather than an operation-specific status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use mtkims_binder::{CallbackEvent, CallbackStatus, Parcel, ServiceManager, Transport};

use crate::error::{Error, Result};
use crate::request::{Correlation, PendingRequest, ReleaseFn, RequestTable, ResponseFn};

pub const RADIO_IFACE: &str = "android.hardware.radio@1.0::IRadio";
pub const RADIO_RESPONSE: &str = "android.hardware.radio@1.0::IRadioResponse";
pub const RADIO_INDICATION: &str = "android.hardware.radio@1.0::IRadioIndication";

/// `IRadio` request codes used by this plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RadioReq {
    SetResponseFunctions = 1,
    Dial = 11,
    SendSms = 26,
}

/// `IRadioResponse` codes for the requests above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RadioResp {
    Dial = 10,
    SendSms = 25,
}

/// `RadioError` subset observed by completions; anything non-zero is a
/// failure as far as the adapters are concerned.
pub const RADIO_ERROR_NONE: i32 = 0;

/// CLIR mode carried in a dial request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Clir {
    Default = 0,
    Invocation = 1,
    Suppression = 2,
}

struct Inner {
    name: String,
    transport: Arc<dyn Transport>,
    requests: Mutex<RequestTable>,
    /// The rilConnected indication never arrives on the IMS AOSP slot, so
    /// the client is forced connected right after the handshake.
    connected: AtomicBool,
    torn_down: AtomicBool,
}

/// Client handle to the per-slot AOSP radio service.
#[derive(Clone)]
pub struct RadioClient {
    inner: Arc<Inner>,
}

impl RadioClient {
    /// Resolve `IRadio/<slot>` and register the response endpoints.
    pub async fn connect(sm: &dyn ServiceManager, slot: &str) -> Result<Self> {
        let name = format!("{}/{}", RADIO_IFACE, slot);
        let connection = sm
            .get_service(&name)
            .await
            .map_err(|_| Error::Unavailable(name.clone()))?;
        debug!("connected to {}", name);

        let mut handshake = Parcel::new();
        handshake.write_string(RADIO_RESPONSE);
        handshake.write_string(RADIO_INDICATION);
        connection
            .transport
            .transact_sync(RadioReq::SetResponseFunctions as i32, handshake)
            .await
            .map_err(|e| Error::Handshake(e.to_string()))?;

        let inner = Arc::new(Inner {
            name,
            transport: connection.transport,
            requests: Mutex::new(RequestTable::new()),
            connected: AtomicBool::new(true),
            torn_down: AtomicBool::new(false),
        });
        Self::spawn_demux(inner.clone(), connection.callbacks);
        Ok(Self { inner })
    }

    pub fn pending_requests(&self) -> usize {
        self.inner.requests.lock().unwrap().len()
    }

    /// Submit a raw radio request. Same insert-before-send and zero-on-
    /// failure contract as the vendor path; the completion observes the
    /// envelope's error word.
    pub async fn submit<W, F>(
        &self,
        req_code: RadioReq,
        resp_code: RadioResp,
        write_args: W,
        complete: F,
        on_release: Option<ReleaseFn>,
    ) -> u32
    where
        W: FnOnce(&mut Parcel),
        F: FnOnce(i32) + Send + 'static,
    {
        let inner = &self.inner;
        if inner.torn_down.load(Ordering::SeqCst) || !inner.connected.load(Ordering::SeqCst) {
            return 0;
        }

        let handler: ResponseFn = Box::new(move |reader| {
            // Full RadioResponseInfo: type, serial (already correlated by
            // the demux), error.
            let error = match read_response_info(reader) {
                Ok((_type, _serial, error)) => error,
                Err(_) => {
                    warn!("failed to parse radio response info");
                    -1
                }
            };
            complete(error);
        });

        let id = {
            let mut table = inner.requests.lock().unwrap();
            let id = table.alloc_id();
            table.insert(PendingRequest::new(id, resp_code as i32, handler, on_release));
            id
        };

        let mut parcel = Parcel::new();
        parcel.write_u32(id);
        write_args(&mut parcel);

        match inner.transport.transact(req_code as i32, parcel).await {
            Ok(tx) => {
                trace!("{} request {:?} serial {}", inner.name, req_code, id);
                inner.requests.lock().unwrap().set_tx(id, tx);
                id
            }
            Err(e) => {
                warn!("{} failed to submit {:?}: {}", inner.name, req_code, e);
                drop(inner.requests.lock().unwrap().remove(id));
                0
            }
        }
    }

    /// IRadio::dial: number plus CLIR, empty UUS info.
    pub async fn dial<F>(&self, number: &str, clir: Clir, complete: F) -> u32
    where
        F: FnOnce(i32) + Send + 'static,
    {
        let number = number.to_owned();
        self.submit(
            RadioReq::Dial,
            RadioResp::Dial,
            move |p| {
                p.write_string(&number);
                p.write_i32(clir as i32);
                p.write_u32(0); // no UUS info
            },
            complete,
            None,
        )
        .await
    }

    /// IRadio::sendSms: SMSC plus the hex-encoded PDU, the GSM message
    /// shape of the standard envelope.
    pub async fn send_sms<F>(&self, smsc: &str, pdu: &[u8], complete: F) -> u32
    where
        F: FnOnce(i32) + Send + 'static,
    {
        let smsc = smsc.to_owned();
        let pdu_hex = hex_encode(pdu);
        self.submit(
            RadioReq::SendSms,
            RadioResp::SendSms,
            move |p| {
                p.write_string(&smsc);
                p.write_string(&pdu_hex);
            },
            complete,
            None,
        )
        .await
    }

    /// Same contract as the vendor-path cancel: idempotent, release-only.
    pub fn cancel(&self, id: u32) {
        let entry = self.inner.requests.lock().unwrap().remove(id);
        if let Some(entry) = entry {
            trace!("{} cancel serial {}", self.inner.name, id);
            if entry.tx.is_active() {
                self.inner.transport.cancel(entry.tx);
            }
            entry.release();
        }
    }

    /// Release every outstanding entry and close the transport. Idempotent.
    pub async fn teardown(&self) {
        let inner = &self.inner;
        if inner.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let entries = inner.requests.lock().unwrap().drain();
        debug!("{} teardown, releasing {} request(s)", inner.name, entries.len());
        for entry in entries {
            if entry.tx.is_active() {
                inner.transport.cancel(entry.tx);
            }
            entry.release();
        }
        if let Err(e) = inner.transport.close().await {
            warn!("{} transport close failed: {}", inner.name, e);
        }
    }

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
                    CallbackEvent::Indication { code, status, .. } => {
                        // rilConnected and friends; nothing on this path
                        // acts on them.
                        debug!("{} ignoring indication {}", inner.name, code);
                        if let Some(reply) = status {
                            let _ = reply.send(CallbackStatus::Ok);
                        }
                    }
                }
            }
            trace!("{} callback demux loop exited", inner.name);
        });
    }

    /// Responses open with `RadioResponseInfo`; the serial is its second
    /// word. The demux probes it without consuming the payload; the
    /// matched entry re-reads the whole envelope itself.
    fn on_response(inner: &Arc<Inner>, code: i32, parcel: Parcel) -> CallbackStatus {
        let reader = parcel.into_reader();
        let serial = match read_response_info(&mut reader.clone()) {
            Ok((_type, serial, _error)) => serial,
            Err(e) => {
                warn!("{} response {} without response info: {}", inner.name, code, e);
                return CallbackStatus::Ok;
            }
        };
        if serial == 0 {
            warn!("{} dropping response {} with zero serial", inner.name, code);
            return CallbackStatus::Ok;
        }

        let correlation = inner.requests.lock().unwrap().correlate(serial, code);
        match correlation {
            Correlation::Matched(entry) => {
                trace!("{} response {} serial {}", inner.name, code, serial);
                entry.complete(reader);
                CallbackStatus::Ok
            }
            Correlation::CodeMismatch | Correlation::NotFound => {
                warn!("{} unexpected response {} {}", inner.name, RADIO_RESPONSE, code);
                CallbackStatus::Failed
            }
        }
    }
}

/// Parse a `RadioResponseInfo` envelope: (type, serial, error).
fn read_response_info(
    reader: &mut mtkims_binder::Reader,
) -> mtkims_binder::Result<(i32, u32, i32)> {
    let type_word = reader.read_i32()?;
    let serial = reader.read_u32()?;
    let error = reader.read_i32()?;
    Ok((type_word, serial, error))
}

fn hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        out.push_str(&format!("{:02X}", b));
    }
    out
}
