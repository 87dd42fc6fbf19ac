//! Incremental frame parser over the raw TCP byte stream.
//!
//! Every frame on the wire is a 4-byte big-endian payload length followed by
//! the payload. [`StreamParser::feed`] appends whatever the socket produced;
//! [`StreamParser::next_message`] pops the oldest complete frame, or `None`
//! while the buffer holds less than a full frame.
//!
//! A successful or failed parse of a complete frame always consumes exactly
//! `4 + L` bytes: a whole frame is either delivered or discarded, never left
//! half-eaten in the buffer. The single exception is an oversize length
//! prefix, after which resynchronisation is impossible and the entire buffer
//! is dropped.

use thiserror::Error;
use tracing::warn;

use crate::protocol::codec::{decode_handshake, decode_payload, HandshakeKind};
use crate::protocol::messages::Message;
use crate::protocol::wire::DecodeError;

/// Upper bound on a frame's declared payload length. Anything larger is
/// treated as a hostile or wedged peer (anti-OOM guard).
pub const MAX_FRAME_LEN: u32 = 10 * 1024 * 1024;

/// Errors surfaced by the parser. Both leave the session usable; the caller
/// logs and keeps reading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The length prefix exceeded [`MAX_FRAME_LEN`]; the buffer was flushed.
    #[error("oversize frame: declared payload length {length} bytes")]
    OversizeFrame { length: u32 },

    /// A complete frame of a known variant failed to decode. The frame has
    /// already been consumed.
    #[error("malformed {code} frame: {source}")]
    MalformedFrame {
        code: String,
        #[source]
        source: DecodeError,
    },
}

/// Accumulates stream bytes and yields complete protocol messages.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes received from the socket.
    pub fn feed(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.buffer.extend_from_slice(data);
    }

    /// Bytes currently buffered (complete or not).
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the payload length of the oldest frame if it is fully
    /// buffered, enforcing the oversize guard.
    fn complete_frame_len(&mut self) -> Result<Option<usize>, ParseError> {
        if self.buffer.len() < 4 {
            return Ok(None);
        }
        let length = u32::from_be_bytes([
            self.buffer[0],
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
        ]);
        if length > MAX_FRAME_LEN {
            // No way to find the next frame boundary after a bogus length;
            // drop everything and let the caller decide whether to hang up.
            self.buffer.clear();
            return Err(ParseError::OversizeFrame { length });
        }
        let total = 4 + length as usize;
        if self.buffer.len() < total {
            return Ok(None);
        }
        Ok(Some(length as usize))
    }

    fn consume(&mut self, payload_len: usize) {
        self.buffer.drain(..4 + payload_len);
    }

    /// Pops the oldest complete frame and decodes it by its code bytes.
    ///
    /// Unknown codes are not an error here: they come back as
    /// [`Message::Unknown`] so the dispatcher can log and drop them.
    ///
    /// # Errors
    ///
    /// [`ParseError::OversizeFrame`] flushes the buffer;
    /// [`ParseError::MalformedFrame`] reports a frame that was consumed but
    /// did not decode.
    pub fn next_message(&mut self) -> Result<Option<Message>, ParseError> {
        let Some(payload_len) = self.complete_frame_len()? else {
            return Ok(None);
        };
        let payload = &self.buffer[4..4 + payload_len];
        let code_label = String::from_utf8_lossy(&payload[..payload.len().min(4)]).into_owned();
        let result = decode_payload(payload);
        self.consume(payload_len);

        match result {
            Ok(msg) => Ok(Some(msg)),
            Err(DecodeError::UnknownCode { code }) => {
                warn!(
                    code = %String::from_utf8_lossy(&code),
                    length = payload_len,
                    "unknown message code, skipping frame"
                );
                Ok(Some(Message::Unknown {
                    code,
                    length: payload_len,
                }))
            }
            Err(source) => Err(ParseError::MalformedFrame {
                code: code_label,
                source,
            }),
        }
    }

    /// Pops the oldest complete frame and decodes it as the requested
    /// handshake variant, regardless of its leading bytes.
    ///
    /// This is the only call where the caller, not the payload, selects the
    /// variant; it is used exactly twice per connection.
    ///
    /// # Errors
    ///
    /// As [`StreamParser::next_message`]; a non-handshake or unsupported
    /// protocol name surfaces as [`ParseError::MalformedFrame`].
    pub fn next_handshake(
        &mut self,
        expected: HandshakeKind,
    ) -> Result<Option<Message>, ParseError> {
        let Some(payload_len) = self.complete_frame_len()? else {
            return Ok(None);
        };
        let result = decode_handshake(&self.buffer[4..4 + payload_len], expected);
        self.consume(payload_len);

        match result {
            Ok(msg) => Ok(Some(msg)),
            Err(source) => Err(ParseError::MalformedFrame {
                code: match expected {
                    HandshakeKind::Hello => "Hello".to_string(),
                    HandshakeKind::HelloBack => "HelloBack".to_string(),
                },
                source,
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::encode_frame;

    #[test]
    fn test_empty_buffer_yields_none() {
        let mut p = StreamParser::new();
        assert_eq!(p.next_message().unwrap(), None);
    }

    #[test]
    fn test_three_byte_buffer_yields_none() {
        let mut p = StreamParser::new();
        p.feed(&[0x00, 0x00, 0x00]);
        assert_eq!(p.next_message().unwrap(), None);
    }

    #[test]
    fn test_incomplete_payload_yields_none_until_rest_arrives() {
        let mut p = StreamParser::new();
        p.feed(b"\x00\x00\x00\x04CA");
        assert_eq!(p.next_message().unwrap(), None);
        p.feed(b"LV");
        assert_eq!(p.next_message().unwrap(), Some(Message::KeepAlive));
        assert_eq!(p.buffered(), 0);
    }

    #[test]
    fn test_each_frame_consumes_exactly_its_bytes() {
        let mut p = StreamParser::new();
        let mut stream = encode_frame(&Message::KeepAlive);
        stream.extend_from_slice(&encode_frame(&Message::MouseMove { x: 1, y: 2 }));
        p.feed(&stream);

        assert_eq!(p.next_message().unwrap(), Some(Message::KeepAlive));
        assert_eq!(p.next_message().unwrap(), Some(Message::MouseMove { x: 1, y: 2 }));
        assert_eq!(p.next_message().unwrap(), None);
    }

    #[test]
    fn test_malformed_frame_is_consumed_and_stream_recovers() {
        let mut p = StreamParser::new();
        // CINN declares 10 bytes of fields but the frame only carries 2.
        p.feed(b"\x00\x00\x00\x06CINN\x00\x64");
        p.feed(&encode_frame(&Message::KeepAlive));

        assert!(matches!(
            p.next_message(),
            Err(ParseError::MalformedFrame { .. })
        ));
        // The bad frame is gone; the next one parses.
        assert_eq!(p.next_message().unwrap(), Some(Message::KeepAlive));
    }

    #[test]
    fn test_unknown_code_yields_unknown_message_not_error() {
        let mut p = StreamParser::new();
        p.feed(b"\x00\x00\x00\x06XYZW\x01\x02");
        assert_eq!(
            p.next_message().unwrap(),
            Some(Message::Unknown {
                code: *b"XYZW",
                length: 6
            })
        );
    }

    #[test]
    fn test_oversize_length_flushes_buffer() {
        let mut p = StreamParser::new();
        p.feed(&[0xFF, 0xFF, 0xFF, 0xFF]);
        p.feed(b"garbage that would otherwise linger");

        assert_eq!(
            p.next_message(),
            Err(ParseError::OversizeFrame { length: u32::MAX })
        );
        assert_eq!(p.buffered(), 0);
        // Nothing left: parser waits for fresh bytes.
        assert_eq!(p.next_message().unwrap(), None);
    }

    #[test]
    fn test_next_handshake_decodes_by_caller_choice() {
        let mut p = StreamParser::new();
        p.feed(b"\x00\x00\x00\x0BBarrier\x00\x01\x00\x08");
        let msg = p.next_handshake(HandshakeKind::Hello).unwrap().unwrap();
        match msg {
            Message::Hello(h) => {
                assert_eq!(h.protocol.as_str(), "Barrier");
                assert_eq!((h.major, h.minor), (1, 8));
            }
            other => panic!("expected Hello, got {other:?}"),
        }
    }

    #[test]
    fn test_next_handshake_rejects_bad_protocol_name_and_consumes() {
        let mut p = StreamParser::new();
        p.feed(b"\x00\x00\x00\x0BMumble\x00\x00\x01\x00\x08");
        assert!(matches!(
            p.next_handshake(HandshakeKind::Hello),
            Err(ParseError::MalformedFrame { .. })
        ));
        assert_eq!(p.buffered(), 0);
    }
}
