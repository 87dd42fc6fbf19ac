//! Binary codec mapping [`Message`] values to and from payload bytes.
//!
//! Wire format of an ordinary message payload:
//!
//! ```text
//! [code:4][field 0][field 1]...
//! ```
//!
//! The handshake pair is the one exception: `Hello` and `HelloBack` have no
//! 4-byte code; their payload starts with the 7-byte NUL-padded protocol
//! name, which both selects the variant and is preserved as data. Because of
//! that, the caller must pick the handshake variant explicitly via
//! [`decode_handshake`]; every other variant is selected by the first four
//! payload bytes in [`decode_payload`].
//!
//! Trailing bytes after the last field of a known variant are tolerated and
//! logged at WARN: newer servers may append fields, and rejecting the frame
//! would break interop.

use tracing::warn;

use crate::protocol::messages::{
    ClipboardMsg, EnterMsg, HelloBackMsg, HelloMsg, KeyDownLangMsg, KeyDownMsg, KeyRepeatMsg,
    KeyUpMsg, Message, ProtocolName, ScreenInfoMsg, PROTOCOL_NAME_LEN,
};
use crate::protocol::wire::{DecodeError, WireReader, WireWriter};

/// Which handshake variant the caller expects. See
/// [`StreamParser::next_handshake`](crate::protocol::parser::StreamParser::next_handshake).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeKind {
    Hello,
    HelloBack,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a message into its payload bytes (code + fields, without the
/// frame length prefix).
pub fn encode_payload(msg: &Message) -> Vec<u8> {
    let mut w = WireWriter::with_capacity(16);
    match msg {
        Message::Hello(m) => {
            w.write_fixed_str(m.protocol.as_str(), PROTOCOL_NAME_LEN);
            w.write_u16(m.major);
            w.write_u16(m.minor);
        }
        Message::HelloBack(m) => {
            w.write_fixed_str(m.protocol.as_str(), PROTOCOL_NAME_LEN);
            w.write_u16(m.major);
            w.write_u16(m.minor);
            w.write_var_str(&m.name);
        }
        Message::Close => w.write_bytes(b"CBYE"),
        Message::Enter(m) => {
            w.write_bytes(b"CINN");
            w.write_i16(m.entry_x);
            w.write_i16(m.entry_y);
            w.write_u32(m.sequence);
            w.write_u16(m.mod_mask);
        }
        Message::InfoAck => w.write_bytes(b"CIAK"),
        Message::KeepAlive => w.write_bytes(b"CALV"),
        Message::Leave => w.write_bytes(b"COUT"),
        Message::Noop => w.write_bytes(b"CNOP"),
        Message::ResetOptions => w.write_bytes(b"CROP"),
        Message::ScreenSaver { active } => {
            w.write_bytes(b"CSEC");
            w.write_bool(*active);
        }
        Message::ClipboardGrab { id, sequence } => {
            w.write_bytes(b"CCLP");
            w.write_u8(*id);
            w.write_u32(*sequence);
        }
        Message::KeyDown(m) => {
            w.write_bytes(b"DKDN");
            w.write_u16(m.key_id);
            w.write_u16(m.mod_mask);
            w.write_u16(m.key_button);
        }
        Message::KeyDownLang(m) => {
            w.write_bytes(b"DKDL");
            w.write_u16(m.key_id);
            w.write_u16(m.mod_mask);
            w.write_u16(m.key_button);
            w.write_var_str(&m.language);
        }
        Message::KeyRepeat(m) => {
            w.write_bytes(b"DKRP");
            w.write_u16(m.key_id);
            w.write_u16(m.mod_mask);
            w.write_u16(m.repeat_count);
            w.write_u16(m.key_button);
            w.write_var_str(&m.language);
        }
        Message::KeyUp(m) => {
            w.write_bytes(b"DKUP");
            w.write_u16(m.key_id);
            w.write_u16(m.mod_mask);
            w.write_u16(m.key_button);
        }
        Message::MouseDown { button } => {
            w.write_bytes(b"DMDN");
            w.write_u8(*button);
        }
        Message::MouseMove { x, y } => {
            w.write_bytes(b"DMMV");
            w.write_i16(*x);
            w.write_i16(*y);
        }
        Message::MouseRelMove { dx, dy } => {
            w.write_bytes(b"DMRM");
            w.write_i16(*dx);
            w.write_i16(*dy);
        }
        Message::MouseUp { button } => {
            w.write_bytes(b"DMUP");
            w.write_u8(*button);
        }
        Message::MouseWheel { x_delta, y_delta } => {
            w.write_bytes(b"DMWM");
            w.write_i16(*x_delta);
            w.write_i16(*y_delta);
        }
        Message::Clipboard(m) => {
            w.write_bytes(b"DCLP");
            w.write_u8(m.id);
            w.write_u32(m.sequence);
            w.write_u8(m.mark);
            w.write_var_str(&m.data);
        }
        Message::ScreenInfo(m) => {
            w.write_bytes(b"DINF");
            w.write_i16(m.left);
            w.write_i16(m.top);
            w.write_u16(m.width);
            w.write_u16(m.height);
            w.write_i16(m.warp_zone);
            w.write_i16(m.mouse_x);
            w.write_i16(m.mouse_y);
        }
        Message::SetOptions { options } => {
            w.write_bytes(b"DSOP");
            w.write_u32(options.len() as u32);
            for word in options {
                w.write_u32(*word);
            }
        }
        Message::DragInfo {
            file_count,
            payload,
        } => {
            w.write_bytes(b"DDRG");
            w.write_u16(*file_count);
            w.write_bytes(payload);
        }
        Message::FileTransfer { mark, payload } => {
            w.write_bytes(b"DFTR");
            w.write_u8(*mark);
            w.write_bytes(payload);
        }
        Message::LanguageSync { languages } => {
            w.write_bytes(b"LSYN");
            w.write_var_str(languages);
        }
        Message::SecureInput { app } => {
            w.write_bytes(b"SECN");
            w.write_var_str(app);
        }
        Message::QueryInfo => w.write_bytes(b"QINF"),
        Message::ErrorBad => w.write_bytes(b"EBAD"),
        Message::ErrorBusy => w.write_bytes(b"EBSY"),
        Message::ErrorIncompatible { major, minor } => {
            w.write_bytes(b"EICV");
            w.write_u16(*major);
            w.write_u16(*minor);
        }
        Message::ErrorUnknownName => w.write_bytes(b"EUNK"),
        // Not re-encodable; the original field bytes were discarded on decode.
        Message::Unknown { code, .. } => w.write_bytes(code),
    }
    w.into_bytes()
}

/// Encodes a message as a complete frame: 4-byte big-endian payload length
/// followed by the payload.
pub fn encode_frame(msg: &Message) -> Vec<u8> {
    let payload = encode_payload(msg);
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    frame
}

/// Decodes one ordinary (non-handshake) message payload.
///
/// # Errors
///
/// [`DecodeError::UnknownCode`] when the leading 4 bytes match no known
/// message (recoverable: skip the frame); [`DecodeError::Truncated`] /
/// [`DecodeError::BadEncoding`] when a known variant's fields are malformed.
pub fn decode_payload(payload: &[u8]) -> Result<Message, DecodeError> {
    if payload.len() < 4 {
        return Err(DecodeError::Truncated {
            needed: 4,
            available: payload.len(),
        });
    }
    let code: [u8; 4] = [payload[0], payload[1], payload[2], payload[3]];
    let mut r = WireReader::new(&payload[4..]);

    let msg = match &code {
        b"CBYE" => Message::Close,
        b"CINN" => Message::Enter(EnterMsg {
            entry_x: r.read_i16()?,
            entry_y: r.read_i16()?,
            sequence: r.read_u32()?,
            mod_mask: r.read_u16()?,
        }),
        b"CIAK" => Message::InfoAck,
        b"CALV" => Message::KeepAlive,
        b"COUT" => Message::Leave,
        b"CNOP" => Message::Noop,
        b"CROP" => Message::ResetOptions,
        b"CSEC" => Message::ScreenSaver {
            active: r.read_bool()?,
        },
        b"CCLP" => Message::ClipboardGrab {
            id: r.read_u8()?,
            sequence: r.read_u32()?,
        },
        b"DKDN" => Message::KeyDown(KeyDownMsg {
            key_id: r.read_u16()?,
            mod_mask: r.read_u16()?,
            key_button: r.read_u16()?,
        }),
        b"DKDL" => Message::KeyDownLang(KeyDownLangMsg {
            key_id: r.read_u16()?,
            mod_mask: r.read_u16()?,
            key_button: r.read_u16()?,
            language: r.read_var_str()?,
        }),
        b"DKRP" => Message::KeyRepeat(KeyRepeatMsg {
            key_id: r.read_u16()?,
            mod_mask: r.read_u16()?,
            repeat_count: r.read_u16()?,
            key_button: r.read_u16()?,
            language: r.read_var_str()?,
        }),
        b"DKUP" => Message::KeyUp(KeyUpMsg {
            key_id: r.read_u16()?,
            mod_mask: r.read_u16()?,
            key_button: r.read_u16()?,
        }),
        b"DMDN" => Message::MouseDown {
            button: r.read_u8()?,
        },
        b"DMMV" => Message::MouseMove {
            x: r.read_i16()?,
            y: r.read_i16()?,
        },
        b"DMRM" => Message::MouseRelMove {
            dx: r.read_i16()?,
            dy: r.read_i16()?,
        },
        b"DMUP" => Message::MouseUp {
            button: r.read_u8()?,
        },
        b"DMWM" => Message::MouseWheel {
            x_delta: r.read_i16()?,
            y_delta: r.read_i16()?,
        },
        b"DCLP" => Message::Clipboard(ClipboardMsg {
            id: r.read_u8()?,
            sequence: r.read_u32()?,
            mark: r.read_u8()?,
            data: r.read_var_str()?,
        }),
        b"DINF" => Message::ScreenInfo(ScreenInfoMsg {
            left: r.read_i16()?,
            top: r.read_i16()?,
            width: r.read_u16()?,
            height: r.read_u16()?,
            warp_zone: r.read_i16()?,
            mouse_x: r.read_i16()?,
            mouse_y: r.read_i16()?,
        }),
        b"DSOP" => {
            let count = r.read_u32()? as usize;
            let mut options = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                options.push(r.read_u32()?);
            }
            Message::SetOptions { options }
        }
        b"DDRG" => Message::DragInfo {
            file_count: r.read_u16()?,
            payload: r.read_rest(),
        },
        b"DFTR" => Message::FileTransfer {
            mark: r.read_u8()?,
            payload: r.read_rest(),
        },
        b"LSYN" => Message::LanguageSync {
            languages: r.read_var_str()?,
        },
        b"SECN" => Message::SecureInput {
            app: r.read_var_str()?,
        },
        b"QINF" => Message::QueryInfo,
        b"EBAD" => Message::ErrorBad,
        b"EBSY" => Message::ErrorBusy,
        b"EICV" => Message::ErrorIncompatible {
            major: r.read_u16()?,
            minor: r.read_u16()?,
        },
        b"EUNK" => Message::ErrorUnknownName,
        _ => return Err(DecodeError::UnknownCode { code }),
    };

    if r.remaining() > 0 {
        // Forward-compatible server extension; keep the decoded prefix.
        warn!(
            code = msg.code(),
            trailing = r.remaining(),
            "trailing bytes after last schema field"
        );
    }
    Ok(msg)
}

/// Decodes a handshake payload as the variant the caller expects.
///
/// This is the only place where the variant is chosen by the caller rather
/// than by the payload's code bytes.
///
/// # Errors
///
/// [`DecodeError::BadProtocolName`] when the 7-byte name is not
/// Synergy/Barrier/Deskflow; otherwise the usual truncation/encoding errors.
pub fn decode_handshake(payload: &[u8], expected: HandshakeKind) -> Result<Message, DecodeError> {
    let mut r = WireReader::new(payload);
    let raw_name = r.read_fixed_str(PROTOCOL_NAME_LEN)?;
    let protocol = ProtocolName::from_wire(&raw_name)
        .ok_or(DecodeError::BadProtocolName { name: raw_name })?;
    let major = r.read_u16()?;
    let minor = r.read_u16()?;

    let msg = match expected {
        HandshakeKind::Hello => Message::Hello(HelloMsg {
            protocol,
            major,
            minor,
        }),
        HandshakeKind::HelloBack => Message::HelloBack(HelloBackMsg {
            protocol,
            major,
            minor,
            name: r.read_var_str()?,
        }),
    };

    if r.remaining() > 0 {
        warn!(
            code = msg.code(),
            trailing = r.remaining(),
            "trailing bytes after handshake fields"
        );
    }
    Ok(msg)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
