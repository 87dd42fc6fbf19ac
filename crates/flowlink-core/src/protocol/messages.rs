//! All Synergy/Barrier/Deskflow protocol message types understood by the
//! client.
//!
//! Every ordinary message is identified by a 4-byte ASCII code (`DMMV`,
//! `CALV`, ...). The two handshake messages are the exception: their first
//! seven bytes are the NUL-padded protocol name itself, not a code.
//!
//! Message field order in each struct is the wire order.

/// Length of the fixed protocol-name field in `Hello`/`HelloBack`.
pub const PROTOCOL_NAME_LEN: usize = 7;

// ── Protocol name ─────────────────────────────────────────────────────────────

/// The protocol identifier carried in the handshake.
///
/// `Barrier` is the common value; `Synergy` is accepted for backward
/// compatibility and `Deskflow` for the renamed upstream project. The wire
/// field is seven bytes, so `Deskflow` truncates to `Deskflo` on encode and
/// both spellings are recognised on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolName {
    Synergy,
    Barrier,
    Deskflow,
}

impl ProtocolName {
    /// The canonical name, as configured/displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolName::Synergy => "Synergy",
            ProtocolName::Barrier => "Barrier",
            ProtocolName::Deskflow => "Deskflow",
        }
    }

    /// Parses the NUL-stripped wire field. Case-sensitive; anything else is
    /// an unsupported peer.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "Synergy" => Some(ProtocolName::Synergy),
            "Barrier" => Some(ProtocolName::Barrier),
            // Eight characters do not fit the 7-byte field.
            "Deskflow" | "Deskflo" => Some(ProtocolName::Deskflow),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProtocolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Modifier key mask ─────────────────────────────────────────────────────────

/// Bit values of the modifier mask carried by `CINN` and the key events.
pub mod modifier {
    pub const SHIFT: u16 = 0x0001;
    pub const CONTROL: u16 = 0x0002;
    pub const ALT: u16 = 0x0004;
    pub const META: u16 = 0x0008;
    pub const SUPER: u16 = 0x0010;
    pub const ALT_GR: u16 = 0x0020;
    pub const LEVEL5_LOCK: u16 = 0x0040;
    pub const CAPS_LOCK: u16 = 0x1000;
    pub const NUM_LOCK: u16 = 0x2000;
    pub const SCROLL_LOCK: u16 = 0x4000;
}

// ── Handshake payloads ────────────────────────────────────────────────────────

/// `Hello`: first message on the wire, sent by the server.
///
/// The client inspects the protocol name and version for compatibility and
/// echoes all three values back in [`HelloBackMsg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloMsg {
    pub protocol: ProtocolName,
    pub major: u16,
    pub minor: u16,
}

/// `HelloBack`: the client's handshake reply, carrying its screen name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloBackMsg {
    pub protocol: ProtocolName,
    pub major: u16,
    pub minor: u16,
    pub name: String,
}

// ── Control payloads ──────────────────────────────────────────────────────────

/// `CINN`: the cursor entered this screen from the primary.
///
/// The sequence number must be echoed in subsequent client messages; the
/// modifier mask describes the toggle state the client must synchronise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterMsg {
    pub entry_x: i16,
    pub entry_y: i16,
    pub sequence: u32,
    pub mod_mask: u16,
}

// ── Keyboard payloads ─────────────────────────────────────────────────────────

/// `DKDN`: key press.
///
/// Releases must be keyed on `key_button` (the physical scancode), never on
/// `key_id`: dead keys and layout switches can change the KeyID between
/// press and release, but the physical button is stable across the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDownMsg {
    pub key_id: u16,
    pub mod_mask: u16,
    pub key_button: u16,
}

/// `DKDL`: key press carrying the server keyboard's language code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDownLangMsg {
    pub key_id: u16,
    pub mod_mask: u16,
    pub key_button: u16,
    /// Reserved; decoded but not currently applied.
    pub language: String,
}

/// `DKRP`: key auto-repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRepeatMsg {
    pub key_id: u16,
    pub mod_mask: u16,
    pub repeat_count: u16,
    pub key_button: u16,
    pub language: String,
}

/// `DKUP`: key release. See [`KeyDownMsg`] for the KeyButton rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUpMsg {
    pub key_id: u16,
    pub mod_mask: u16,
    pub key_button: u16,
}

// ── Screen / clipboard payloads ───────────────────────────────────────────────

/// `DCLP`: clipboard data transfer.
///
/// `mark` supports chunked transfer (0 = whole, 1 = first, 2 = middle,
/// 3 = final chunk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardMsg {
    pub id: u8,
    pub sequence: u32,
    pub mark: u8,
    pub data: String,
}

/// `DINF`: this client's screen geometry and cursor position, sent in reply
/// to `QINF` and whenever the resolution changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenInfoMsg {
    pub left: i16,
    pub top: i16,
    pub width: u16,
    pub height: u16,
    /// Obsolete warp-zone size; always 0.
    pub warp_zone: i16,
    pub mouse_x: i16,
    pub mouse_y: i16,
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// All protocol messages, discriminated by their wire code.
///
/// Unrecognised codes decode to [`Message::Unknown`] so the dispatcher can
/// log and skip them without tearing down the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Handshake (no 4-byte code; identified by the protocol-name field)
    Hello(HelloMsg),
    HelloBack(HelloBackMsg),

    // Control
    /// `CBYE`: close the connection gracefully.
    Close,
    /// `CINN`: cursor entered this screen.
    Enter(EnterMsg),
    /// `CIAK`: the primary acknowledged our `DINF`.
    InfoAck,
    /// `CALV`: liveness probe; echoed back verbatim.
    KeepAlive,
    /// `COUT`: cursor left this screen.
    Leave,
    /// `CNOP`: no operation.
    Noop,
    /// `CROP`: reset options to defaults.
    ResetOptions,
    /// `CSEC`: the primary's screensaver started (`true`) or stopped.
    ScreenSaver { active: bool },
    /// `CCLP`: clipboard ownership changed on the other screen.
    ClipboardGrab { id: u8, sequence: u32 },

    // Data: keyboard
    KeyDown(KeyDownMsg),
    KeyDownLang(KeyDownLangMsg),
    KeyRepeat(KeyRepeatMsg),
    KeyUp(KeyUpMsg),

    // Data: mouse
    /// `DMDN`: button press (1 = left, 2 = middle, 3 = right, 4+ extra).
    MouseDown { button: u8 },
    /// `DMMV`: absolute cursor position on this screen.
    MouseMove { x: i16, y: i16 },
    /// `DMRM`: relative motion.
    MouseRelMove { dx: i16, dy: i16 },
    /// `DMUP`: button release.
    MouseUp { button: u8 },
    /// `DMWM`: wheel scroll; values are multiples of ±120 per tick.
    MouseWheel { x_delta: i16, y_delta: i16 },

    // Data: screen / clipboard / transfer
    Clipboard(ClipboardMsg),
    ScreenInfo(ScreenInfoMsg),
    /// `DSOP`: option/value words; count-prefixed list of u32.
    SetOptions { options: Vec<u32> },
    /// `DDRG`: drag began; the trailing payload is kept opaque.
    DragInfo { file_count: u16, payload: Vec<u8> },
    /// `DFTR`: file-transfer chunk; the trailing payload is kept opaque.
    FileTransfer { mark: u8, payload: Vec<u8> },
    /// `LSYN`: comma-separated server language list.
    LanguageSync { languages: String },
    /// `SECN`: an application on the primary requested secure input.
    SecureInput { app: String },

    // Query
    /// `QINF`: the server wants our current `DINF`.
    QueryInfo,

    // Errors (all fatal to the session)
    /// `EBAD`: protocol violation.
    ErrorBad,
    /// `EBSY`: our client name is already connected.
    ErrorBusy,
    /// `EICV`: incompatible protocol versions.
    ErrorIncompatible { major: u16, minor: u16 },
    /// `EUNK`: our client name is not in the server's screen map.
    ErrorUnknownName,

    /// A frame with a code this client does not understand; carried so the
    /// dispatcher can log and drop it.
    Unknown { code: [u8; 4], length: usize },
}

impl Message {
    /// The wire code as a display string, for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Message::Hello(_) => "Hello",
            Message::HelloBack(_) => "HelloBack",
            Message::Close => "CBYE",
            Message::Enter(_) => "CINN",
            Message::InfoAck => "CIAK",
            Message::KeepAlive => "CALV",
            Message::Leave => "COUT",
            Message::Noop => "CNOP",
            Message::ResetOptions => "CROP",
            Message::ScreenSaver { .. } => "CSEC",
            Message::ClipboardGrab { .. } => "CCLP",
            Message::KeyDown(_) => "DKDN",
            Message::KeyDownLang(_) => "DKDL",
            Message::KeyRepeat(_) => "DKRP",
            Message::KeyUp(_) => "DKUP",
            Message::MouseDown { .. } => "DMDN",
            Message::MouseMove { .. } => "DMMV",
            Message::MouseRelMove { .. } => "DMRM",
            Message::MouseUp { .. } => "DMUP",
            Message::MouseWheel { .. } => "DMWM",
            Message::Clipboard(_) => "DCLP",
            Message::ScreenInfo(_) => "DINF",
            Message::SetOptions { .. } => "DSOP",
            Message::DragInfo { .. } => "DDRG",
            Message::FileTransfer { .. } => "DFTR",
            Message::LanguageSync { .. } => "LSYN",
            Message::SecureInput { .. } => "SECN",
            Message::QueryInfo => "QINF",
            Message::ErrorBad => "EBAD",
            Message::ErrorBusy => "EBSY",
            Message::ErrorIncompatible { .. } => "EICV",
            Message::ErrorUnknownName => "EUNK",
            Message::Unknown { .. } => "????",
        }
    }

    /// True for the `E___` family, which the server follows by disconnecting.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Message::ErrorBad
                | Message::ErrorBusy
                | Message::ErrorIncompatible { .. }
                | Message::ErrorUnknownName
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
