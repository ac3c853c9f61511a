//! Opcode table.
//!
//! Every operation has a fixed numeric code, a request schema and a reply
//! schema. The codes are a versioned constant shared with deployed peers:
//!
//! ```text
//! 0    ..= 104   base range      (virtual display, WFD, external display)
//! 105  ..= 999   debug range     (HWC and fence debug flags)
//! 1000 ..        extended range  (display device control)
//! ```
//!
//! Gaps are reserved and must never be reused or renumbered.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use crate::codec::FieldType;

/// Service identity token written at the start of every request.
pub const SERVICE_DESCRIPTOR: &str = "android.hal.ExynosHWCService";

/// First code of the debug range.
pub const DEBUG_RANGE_START: u32 = 105;

/// First code of the extended range.
pub const EXTENDED_RANGE_START: u32 = 1000;

/// Numbering block an opcode belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeRange {
    Base,
    Debug,
    Extended,
}

impl OpcodeRange {
    /// Range containing `code`.
    pub fn of(code: u32) -> Self {
        if code >= EXTENDED_RANGE_START {
            OpcodeRange::Extended
        } else if code >= DEBUG_RANGE_START {
            OpcodeRange::Debug
        } else {
            OpcodeRange::Base
        }
    }
}

/// How the client stub handles the reply of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientMode {
    /// Read the reply fields; the last one is the business status.
    ReadReply,
    /// Return the transport status only; the reply body is never read.
    TransportOnly,
    /// Round trip happens, reply is ignored.
    OneWay,
    /// No transport call; always succeeds.
    Local,
    /// Declared code with no client operation.
    NoStub,
}

/// How the dispatcher reports a handler's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    /// Handler result written to the reply as the reply schema.
    Reply,
    /// Handler result becomes the transport status; empty reply.
    InTransport,
    /// Handler returns nothing; empty reply.
    NoReply,
    /// No handler bound; dispatch answers not-implemented.
    Unbound,
}

/// Static description of one operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpcodeInfo {
    pub opcode: Opcode,
    /// Upper-case name used in log lines.
    pub name: &'static str,
    /// Request fields after the identity token, in wire order.
    pub request: &'static [FieldType],
    /// Reply fields in wire order (empty for no reply body).
    pub reply: &'static [FieldType],
    pub client: ClientMode,
    pub server: ServerMode,
}

impl OpcodeInfo {
    #[inline]
    pub fn code(&self) -> u32 {
        self.opcode.code()
    }

    /// Size of a request body with fixed fields only, `None` if it has a list.
    pub fn fixed_request_size(&self) -> Option<usize> {
        self.request.iter().map(|f| f.fixed_size()).sum()
    }
}

macro_rules! opcodes {
    ($(
        $variant:ident = $code:literal, $name:literal,
        [$($req:ident),*] => [$($rep:ident),*], $client:ident, $server:ident;
    )+) => {
        /// Remote operation identifier.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u32)]
        pub enum Opcode {
            $($variant = $code,)+
        }

        impl Opcode {
            /// Every declared opcode in ascending code order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant),+];

            /// Look up a declared opcode by code.
            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(Opcode::$variant),)+
                    _ => None,
                }
            }

            /// Static schema entry for this opcode.
            pub fn info(self) -> &'static OpcodeInfo {
                match self {
                    $(Opcode::$variant => &OpcodeInfo {
                        opcode: Opcode::$variant,
                        name: $name,
                        request: &[$(FieldType::$req),*],
                        reply: &[$(FieldType::$rep),*],
                        client: ClientMode::$client,
                        server: ServerMode::$server,
                    },)+
                }
            }
        }
    };
}

opcodes! {
    AddVirtualDisplayDevice = 0, "ADD_VIRTUAL_DISPLAY_DEVICE",
        [] => [Int32], ReadReply, Reply;
    DestroyVirtualDisplayDevice = 1, "DESTROY_VIRTUAL_DISPLAY_DEVICE",
        [] => [Int32], ReadReply, Reply;
    SetWfdMode = 2, "SET_WFD_MODE",
        [Uint32] => [Int32], ReadReply, Reply;
    GetWfdMode = 3, "GET_WFD_MODE",
        [] => [Int32], ReadReply, Reply;
    SendWfdCommand = 4, "SEND_WFD_COMMAND",
        [Int32, Int32, Int32] => [Int32], ReadReply, Reply;
    SetSecureVdsMode = 5, "SET_SECURE_VDS_MODE",
        [Uint32] => [Int32], ReadReply, Reply;
    SetWfdOutputResolution = 6, "SET_WFD_OUTPUT_RESOLUTION",
        [Uint32, Uint32] => [Int32], ReadReply, Reply;
    GetWfdOutputResolution = 7, "GET_WFD_OUTPUT_RESOLUTION",
        [] => [Uint32, Uint32, Int32], ReadReply, Reply;
    SetPresentationMode = 8, "SET_PRESENTATION_MODE",
        [Bool] => [], OneWay, NoReply;
    GetPresentationMode = 9, "GET_PRESENTATION_MODE",
        [] => [Int32], ReadReply, Reply;
    SetVdsGlesFormat = 10, "SET_VDS_GLES_FORMAT",
        [Int32] => [Int32], ReadReply, Reply;
    HwcControl = 11, "HWC_CONTROL",
        [Uint32, Uint32, Int32] => [Int32], ReadReply, Reply;
    SetBootFinished = 12, "SET_BOOT_FINISHED",
        [] => [], OneWay, NoReply;
    SetVirtualHpd = 13, "SET_VIRTUAL_HPD",
        [] => [], NoStub, Unbound;
    GetExternalDisplayConfig = 14, "GET_EXTERNAL_DISPLAY_CONFIG",
        [] => [Int32], ReadReply, Reply;
    SetExternalDisplayConfig = 15, "SET_EXTERNAL_DISPLAY_CONFIG",
        [Uint32] => [Int32], ReadReply, Reply;
    EnableMpp = 16, "ENABLE_MPP",
        [Uint32, Uint32, Uint32, Uint32] => [], OneWay, NoReply;
    SetExternalVsync = 17, "SET_EXTERNAL_VSYNC",
        [Uint32] => [Int32], ReadReply, Unbound;
    SetDdiScaler = 18, "SET_DDISCALER",
        [Uint32, Uint32, Uint32] => [Int32], ReadReply, Reply;
    GetExternalHdrCapa = 19, "GET_EXTERNAL_HDR_CAPA",
        [] => [Int32], ReadReply, Reply;
    SetScaleDownRatio = 20, "SET_SCALE_DOWN_RATIO",
        [Uint32, Uint32, Uint32, Uint32] => [], OneWay, NoReply;

    SetHwcDebug = 105, "SET_HWC_DEBUG",
        [Int32] => [Int32], OneWay, Reply;
    GetHwcDebug = 106, "GET_HWC_DEBUG",
        [] => [Uint32], ReadReply, Reply;
    SetHwcFenceDebug = 107, "SET_HWC_FENCE_DEBUG",
        [Uint32, Uint32, Uint32] => [], OneWay, NoReply;
    GetHwcFenceDebug = 108, "GET_HWC_FENCE_DEBUG",
        [] => [], OneWay, Unbound;

    SetDisplayDeviceMode = 1000, "SET_DISPLAY_DEVICE_MODE",
        [Int32, Int32] => [Int32], Local, Reply;
    SetPanelGammaTableSource = 1001, "SET_PANEL_GAMMA_TABLE_SOURCE",
        [Int32, Int32, Int32] => [Int32], Local, Reply;
    SetDisplayBrightness = 1002, "SET_DISPLAY_BRIGHTNESS",
        [Int32, Float32] => [Int32], TransportOnly, Reply;
    SetDisplayLhbm = 1003, "SET_DISPLAY_LHBM",
        [Int32, Uint32] => [Int32], TransportOnly, Reply;
    SetLbeCtrl = 1004, "SET_LBE_CTRL",
        [Uint32, Uint32, Uint32] => [], OneWay, NoReply;
    SetMinIdleRefreshRate = 1005, "SET_MIN_IDLE_REFRESH_RATE",
        [Uint32, Int32] => [], TransportOnly, InTransport;
    SetRefreshRateThrottle = 1006, "SET_REFRESH_RATE_THROTTLE",
        [Uint32, Int32] => [], TransportOnly, InTransport;
    SetDisplayRcdLayerEnabled = 1007, "SET_DISPLAY_RCDLAYER_ENABLED",
        [Uint32, Bool] => [], TransportOnly, InTransport;
    TriggerDisplayIdleEnter = 1008, "TRIGGER_DISPLAY_IDLE_ENTER",
        [Uint32, Uint32] => [], TransportOnly, InTransport;
    SetDisplayDbm = 1009, "SET_DISPLAY_DBM",
        [Int32, Uint32] => [Int32], TransportOnly, Reply;
    SetDisplayMultiThreadedPresent = 1010, "SET_DISPLAY_MULTI_THREADED_PRESENT",
        [Int32, Bool] => [Int32], TransportOnly, Reply;
    TriggerRefreshRateIndicatorUpdate = 1011, "TRIGGER_REFRESH_RATE_INDICATOR_UPDATE",
        [Uint32, Uint32] => [], TransportOnly, InTransport;
    IgnoreDisplayBrightnessUpdateRequests = 1012, "IGNORE_DISPLAY_BRIGHTNESS_UPDATE_REQUESTS",
        [Int32, Bool] => [Int32], TransportOnly, Reply;
    SetDisplayBrightnessNits = 1013, "SET_DISPLAY_BRIGHTNESS_NITS",
        [Int32, Float32] => [Int32], TransportOnly, Reply;
    SetDisplayBrightnessDbv = 1014, "SET_DISPLAY_BRIGHTNESS_DBV",
        [Int32, Uint32] => [Int32], TransportOnly, Reply;
    DumpBuffers = 1015, "DUMP_BUFFERS",
        [Uint32, Int32] => [], TransportOnly, InTransport;
    SetPresentTimeoutParameters = 1016, "SET_PRESENT_TIMEOUT_PARAMETERS",
        [Int32, Int32, PairList] => [Int32], TransportOnly, Reply;
    SetPresentTimeoutController = 1017, "SET_PRESENT_TIMEOUT_CONTROLLER",
        [Int32, Uint32] => [Int32], TransportOnly, Reply;
    SetFixedTe2Rate = 1018, "SET_FIXED_TE2_RATE",
        [Uint32, Int32] => [], TransportOnly, InTransport;
}

impl Opcode {
    /// Wire code.
    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Upper-case name used in log lines.
    #[inline]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    #[inline]
    pub fn range(self) -> OpcodeRange {
        OpcodeRange::of(self.code())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

/// Read-only protocol table shared by the stub and the dispatcher.
///
/// Built once with [`OpcodeTable::new`] and passed to both sides; there is
/// no process-wide registration.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    descriptor: String,
    by_code: HashMap<u32, &'static OpcodeInfo>,
}

impl OpcodeTable {
    /// Table for the standard service descriptor.
    pub fn new() -> Self {
        Self::with_descriptor(SERVICE_DESCRIPTOR)
    }

    /// Table for a service registered under a different descriptor.
    pub fn with_descriptor(descriptor: impl Into<String>) -> Self {
        let by_code = Opcode::ALL
            .iter()
            .map(|op| (op.code(), op.info()))
            .collect();
        Self {
            descriptor: descriptor.into(),
            by_code,
        }
    }

    /// Identity token expected at the start of every request.
    #[inline]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Look up an opcode by wire code.
    #[inline]
    pub fn get(&self, code: u32) -> Option<&'static OpcodeInfo> {
        self.by_code.get(&code).copied()
    }

    /// Check if `code` is a declared opcode.
    #[inline]
    pub fn contains(&self, code: u32) -> bool {
        self.by_code.contains_key(&code)
    }

    /// Number of declared opcodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// All entries in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = &'static OpcodeInfo> {
        Opcode::ALL.iter().map(|op| op.info())
    }

    /// JSON description of the table for tooling and peer checks.
    ///
    /// ```
    /// use hwc_service::protocol::OpcodeTable;
    ///
    /// let desc = OpcodeTable::new().describe();
    /// assert_eq!(desc["opcodes"][0]["name"], "ADD_VIRTUAL_DISPLAY_DEVICE");
    /// ```
    pub fn describe(&self) -> Value {
        let opcodes: Vec<Value> = self
            .iter()
            .map(|info| {
                json!({
                    "code": info.code(),
                    "name": info.name,
                    "request": info.request,
                    "reply": info.reply,
                    "client": info.client,
                    "server": info.server,
                })
            })
            .collect();

        json!({
            "descriptor": self.descriptor,
            "opcodes": opcodes,
        })
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}
