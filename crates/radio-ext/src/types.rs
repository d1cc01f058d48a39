//! Wire contract of the vendor radio-extension service.
//!
//! The numeric codes and interface names in this module are the bit-exact
//! contract with the remote service; changing any of them breaks
//! interoperability with the real vendor implementation.

use mtkims_binder::{Reader, Result};

pub const MTK_RADIO_IFACE_PREFIX: &str = "vendor.mediatek.hardware.mtkradioex@";
pub const MTK_RADIO: &str = "vendor.mediatek.hardware.mtkradioex@3.0::IMtkRadioEx";
pub const MTK_RADIO_RESPONSE: &str = "vendor.mediatek.hardware.mtkradioex@3.0::IImsRadioResponse";
pub const MTK_RADIO_INDICATION: &str = "vendor.mediatek.hardware.mtkradioex@3.0::IImsRadioIndication";

/// Request codes on `IMtkRadioEx` used by this plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MtkRadioReq {
    SetResponseFunctionsIms = 3,
    VideoCallAccept = 10,
    ImsEctCommand = 11,
    ControlCall = 12,
    ImsDeregNotification = 13,
    SetImsEnabled = 14,
    SetImsCfg = 15,
    GetProvisionValue = 16,
    HangupAll = 48,
    SetCallIndication = 49,
    SendImsSmsEx = 97,
    AcknowledgeLastIncomingGsmSmsEx = 98,
    SetWifiEnabled = 137,
    SetWifiAssociated = 138,
    SetWifiSignalLevel = 139,
    SetWifiIpAddress = 140,
    SetImsCfgFeatureValue = 151,
}

/// Response codes on `IImsRadioResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ImsRadioResp {
    HangupAll = 1,
    SetCallIndication = 2,
    VideoCallAccept = 3,
    ImsEctCommand = 4,
    ControlCall = 5,
    ImsDeregNotification = 6,
    SetImsEnabled = 7,
    SetImsCfg = 8,
    GetProvisionValue = 9,
    SetImsCfgFeatureValue = 43,
}

/// The paired request/response code table (request, response, call name).
pub const IMS_CALL_REQUESTS: &[(MtkRadioReq, ImsRadioResp, &str)] = &[
    (MtkRadioReq::VideoCallAccept, ImsRadioResp::VideoCallAccept, "videoCallAccept"),
    (MtkRadioReq::ImsEctCommand, ImsRadioResp::ImsEctCommand, "imsEctCommand"),
    (MtkRadioReq::ControlCall, ImsRadioResp::ControlCall, "controlCall"),
    (MtkRadioReq::ImsDeregNotification, ImsRadioResp::ImsDeregNotification, "imsDeregNotification"),
    (MtkRadioReq::SetImsEnabled, ImsRadioResp::SetImsEnabled, "setImsEnabled"),
    (MtkRadioReq::SetImsCfg, ImsRadioResp::SetImsCfg, "setImsCfg"),
    (MtkRadioReq::GetProvisionValue, ImsRadioResp::GetProvisionValue, "getProvisionValue"),
    (MtkRadioReq::HangupAll, ImsRadioResp::HangupAll, "hangupAll"),
    (MtkRadioReq::SetCallIndication, ImsRadioResp::SetCallIndication, "setCallIndication"),
    (MtkRadioReq::SetImsCfgFeatureValue, ImsRadioResp::SetImsCfgFeatureValue, "setImsCfgFeatureValue"),
];

/// Indication codes on `IImsRadioIndication`, complete table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ImsRadioInd {
    IncomingCallIndication = 1,
    CallInfoIndication = 2,
    EconfResultIndication = 3,
    SipCallProgressIndicator = 4,
    CallmodChangeIndicator = 5,
    VideoCapabilityIndicator = 6,
    OnUssi = 7,
    GetProvisionDone = 8,
    OnXui = 9,
    OnVolteSubscription = 10,
    SuppSvcNotify = 11,
    ImsEventPackageIndication = 12,
    ImsRegistrationInfo = 13,
    ImsEnableDone = 14,
    ImsDisableDone = 15,
    ImsEnableStart = 16,
    ImsDisableStart = 17,
    EctIndication = 18,
    VolteSetting = 19,
    ImsBearerStateNotify = 20,
    ImsBearerInit = 21,
    ImsDeregDone = 22,
    ImsSupportEcc = 23,
    ImsRadioInfoChange = 24,
    SpeechCodecInfoIndication = 25,
    ImsConferenceInfoIndication = 26,
    LteMessageWaitingIndication = 27,
    ImsDialogIndication = 28,
    ImsCfgDynamicImsSwitchComplete = 29,
    ImsCfgFeatureChanged = 30,
    ImsCfgConfigChanged = 31,
    ImsCfgConfigLoaded = 32,
    ImsDataInfoNotify = 33,
    NewSmsEx = 34,
    NewSmsStatusReportEx = 35,
    CdmaNewSmsEx = 36,
    NoEmergencyCallbackMode = 37,
    ImsRedialEmergencyIndication = 38,
    ImsRtpInfo = 39,
    RttCapabilityIndication = 40,
    RttModifyResponse = 41,
    RttTextReceive = 42,
    RttModifyRequestReceive = 43,
    AudioIndication = 44,
    SendVopsIndication = 45,
    CallAdditionalInfoInd = 46,
    SipHeaderReport = 47,
    CallRatIndication = 48,
    SipRegInfoInd = 49,
    ImsRegStatusReport = 50,
    ImsRegInfoInd = 51,
    OnSsacStatus = 52,
    EregrtInfoInd = 53,
    VideoRingtoneEventInd = 54,
    OnMdInternetUsageInd = 55,
    ImsRegFlagInd = 56,
}

impl ImsRadioInd {
    /// Static code table lookup.
    pub fn from_code(code: u32) -> Option<Self> {
        use ImsRadioInd::*;
        Some(match code {
            1 => IncomingCallIndication,
            2 => CallInfoIndication,
            3 => EconfResultIndication,
            4 => SipCallProgressIndicator,
            5 => CallmodChangeIndicator,
            6 => VideoCapabilityIndicator,
            7 => OnUssi,
            8 => GetProvisionDone,
            9 => OnXui,
            10 => OnVolteSubscription,
            11 => SuppSvcNotify,
            12 => ImsEventPackageIndication,
            13 => ImsRegistrationInfo,
            14 => ImsEnableDone,
            15 => ImsDisableDone,
            16 => ImsEnableStart,
            17 => ImsDisableStart,
            18 => EctIndication,
            19 => VolteSetting,
            20 => ImsBearerStateNotify,
            21 => ImsBearerInit,
            22 => ImsDeregDone,
            23 => ImsSupportEcc,
            24 => ImsRadioInfoChange,
            25 => SpeechCodecInfoIndication,
            26 => ImsConferenceInfoIndication,
            27 => LteMessageWaitingIndication,
            28 => ImsDialogIndication,
            29 => ImsCfgDynamicImsSwitchComplete,
            30 => ImsCfgFeatureChanged,
            31 => ImsCfgConfigChanged,
            32 => ImsCfgConfigLoaded,
            33 => ImsDataInfoNotify,
            34 => NewSmsEx,
            35 => NewSmsStatusReportEx,
            36 => CdmaNewSmsEx,
            37 => NoEmergencyCallbackMode,
            38 => ImsRedialEmergencyIndication,
            39 => ImsRtpInfo,
            40 => RttCapabilityIndication,
            41 => RttModifyResponse,
            42 => RttTextReceive,
            43 => RttModifyRequestReceive,
            44 => AudioIndication,
            45 => SendVopsIndication,
            46 => CallAdditionalInfoInd,
            47 => SipHeaderReport,
            48 => CallRatIndication,
            49 => SipRegInfoInd,
            50 => ImsRegStatusReport,
            51 => ImsRegInfoInd,
            52 => OnSsacStatus,
            53 => EregrtInfoInd,
            54 => VideoRingtoneEventInd,
            55 => OnMdInternetUsageInd,
            56 => ImsRegFlagInd,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        use ImsRadioInd::*;
        match self {
            IncomingCallIndication => "incomingCallIndication",
            CallInfoIndication => "callInfoIndication",
            EconfResultIndication => "econfResultIndication",
            SipCallProgressIndicator => "sipCallProgressIndicator",
            CallmodChangeIndicator => "callmodChangeIndicator",
            VideoCapabilityIndicator => "videoCapabilityIndicator",
            OnUssi => "onUssi",
            GetProvisionDone => "getProvisionDone",
            OnXui => "onXui",
            OnVolteSubscription => "onVolteSubscription",
            SuppSvcNotify => "suppSvcNotify",
            ImsEventPackageIndication => "imsEventPackageIndication",
            ImsRegistrationInfo => "imsRegistrationInfo",
            ImsEnableDone => "imsEnableDone",
            ImsDisableDone => "imsDisableDone",
            ImsEnableStart => "imsEnableStart",
            ImsDisableStart => "imsDisableStart",
            EctIndication => "ectIndication",
            VolteSetting => "volteSetting",
            ImsBearerStateNotify => "imsBearerStateNotify",
            ImsBearerInit => "imsBearerInit",
            ImsDeregDone => "imsDeregDone",
            ImsSupportEcc => "imsSupportEcc",
            ImsRadioInfoChange => "imsRadioInfoChange",
            SpeechCodecInfoIndication => "speechCodecInfoIndication",
            ImsConferenceInfoIndication => "imsConferenceInfoIndication",
            LteMessageWaitingIndication => "lteMessageWaitingIndication",
            ImsDialogIndication => "imsDialogIndication",
            ImsCfgDynamicImsSwitchComplete => "imsCfgDynamicImsSwitchComplete",
            ImsCfgFeatureChanged => "imsCfgFeatureChanged",
            ImsCfgConfigChanged => "imsCfgConfigChanged",
            ImsCfgConfigLoaded => "imsCfgConfigLoaded",
            ImsDataInfoNotify => "imsDataInfoNotify",
            NewSmsEx => "newSmsEx",
            NewSmsStatusReportEx => "newSmsStatusReportEx",
            CdmaNewSmsEx => "cdmaNewSmsEx",
            NoEmergencyCallbackMode => "noEmergencyCallbackMode",
            ImsRedialEmergencyIndication => "imsRedialEmergencyIndication",
            ImsRtpInfo => "imsRtpInfo",
            RttCapabilityIndication => "rttCapabilityIndication",
            RttModifyResponse => "rttModifyResponse",
            RttTextReceive => "rttTextReceive",
            RttModifyRequestReceive => "rttModifyRequestReceive",
            AudioIndication => "audioIndication",
            SendVopsIndication => "sendVopsIndication",
            CallAdditionalInfoInd => "callAdditionalInfoInd",
            SipHeaderReport => "sipHeaderReport",
            CallRatIndication => "callRatIndication",
            SipRegInfoInd => "sipRegInfoInd",
            ImsRegStatusReport => "imsRegStatusReport",
            ImsRegInfoInd => "imsRegInfoInd",
            OnSsacStatus => "onSsacStatus",
            EregrtInfoInd => "eregrtInfoInd",
            VideoRingtoneEventInd => "videoRingtoneEventInd",
            OnMdInternetUsageInd => "onMDInternetUsageInd",
            ImsRegFlagInd => "imsRegFlagInd",
        }
    }
}

/// `ImsConfig.FeatureConstants` in AOSP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ImsFeatureType {
    VoiceOverLte = 0,
    VideoOverLte = 1,
    VoiceOverWifi = 2,
    VideoOverWifi = 3,
    UtOverLte = 4,
    UtOverWifi = 5,
}

/// `TelephonyManager.NETWORK_TYPES`
/// note: the numeric values are different from the RADIO_TECH enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum NetworkType {
    Unknown = 0,
    Gprs = 1,
    Edge = 2,
    Umts = 3,
    Cdma = 4,
    Evdo0 = 5,
    EvdoA = 6,
    OneXRtt = 7,
    Hsdpa = 8,
    Hsupa = 9,
    Hspa = 10,
    Iden = 11,
    EvdoB = 12,
    Lte = 13,
    Ehrpd = 14,
    Hspap = 15,
    Gsm = 16,
    TdScdma = 17,
    Iwlan = 18,
    LteCa = 19,
    Nr = 20,
}

/// Trailing marker of multi-value feature-config requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum IsLast {
    Null = -1,
    False = 0,
    True = 1,
}

/// Reply mode for `setCallIndication`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum IncomingCallMode {
    Allow = 0,
    Disallow = 1,
}

/// Registration status report types carried by `imsRegStatusReport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegStatusReportType {
    Registering,
    Registered,
    RegisterFail,
    /// Any value outside the three-value report type.
    Other(u32),
}

impl RegStatusReportType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => RegStatusReportType::Registering,
            1 => RegStatusReportType::Registered,
            2 => RegStatusReportType::RegisterFail,
            other => RegStatusReportType::Other(other),
        }
    }
}

/// Message types carried by `callInfoIndication`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CallInfoMsgType {
    Setup = 0,
    Alert = 2,
    Connected = 6,
    MoCallIdAssign = 130,
    Held = 131,
    Active = 132,
    Disconnected = 133,
    RemoteHold = 135,
    RemoteResume = 136,
}

impl CallInfoMsgType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        use CallInfoMsgType::*;
        Some(match raw {
            0 => Setup,
            2 => Alert,
            6 => Connected,
            130 => MoCallIdAssign,
            131 => Held,
            132 => Active,
            133 => Disconnected,
            135 => RemoteHold,
            136 => RemoteResume,
            _ => return None,
        })
    }
}

/// Parsed `callInfoIndication` payload.
#[derive(Debug, Clone)]
pub struct CallInfo {
    pub call_id: u32,
    pub msg_type: u32,
    pub call_mode: u32,
    pub number: String,
}

impl CallInfo {
    pub fn parse(r: &mut Reader) -> Result<Self> {
        Ok(Self {
            call_id: r.read_u32()?,
            msg_type: r.read_u32()?,
            call_mode: r.read_u32()?,
            number: r.read_string()?,
        })
    }
}

/// Parsed `imsRegStatusReport` payload.
#[derive(Debug, Clone)]
pub struct ImsRegStatusInfo {
    pub report_type: u32,
    pub account_id: u32,
    pub expire_time: u32,
    pub error_code: u32,
    pub uri: String,
    pub error_msg: String,
}

impl ImsRegStatusInfo {
    pub fn parse(r: &mut Reader) -> Result<Self> {
        Ok(Self {
            report_type: r.read_u32()?,
            account_id: r.read_u32()?,
            expire_time: r.read_u32()?,
            error_code: r.read_u32()?,
            uri: r.read_string()?,
            error_msg: r.read_string()?,
        })
    }

    pub fn status(&self) -> RegStatusReportType {
        RegStatusReportType::from_raw(self.report_type)
    }
}

/// Parsed `incomingCallIndication` payload. All fields travel as strings.
#[derive(Debug, Clone)]
pub struct IncomingCallNotification {
    pub call_id: String,
    pub number: String,
    pub call_type: String,
    pub call_mode: String,
    pub seq_no: String,
    pub redirect_number: String,
    pub to_number: String,
}

impl IncomingCallNotification {
    pub fn parse(r: &mut Reader) -> Result<Self> {
        Ok(Self {
            call_id: r.read_string()?,
            number: r.read_string()?,
            call_type: r.read_string()?,
            call_mode: r.read_string()?,
            seq_no: r.read_string()?,
            redirect_number: r.read_string()?,
            to_number: r.read_string()?,
        })
    }
}
