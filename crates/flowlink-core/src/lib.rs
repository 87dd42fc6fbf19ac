//! # flowlink-core
//!
//! Shared library for Flowlink containing the Synergy/Barrier/Deskflow wire
//! protocol (message types, binary codec, stream parser) and the key code
//! translation tables used by the input injector.
//!
//! This crate has zero dependencies on OS APIs or network sockets; everything
//! here operates on byte slices and plain values so it can be tested without
//! a server or a virtual device.

pub mod keymap;
pub mod protocol;

/// Re-export commonly used types at the crate root for convenience.
pub use keymap::KeyMapper;
pub use protocol::codec::{decode_handshake, decode_payload, encode_frame, encode_payload};
pub use protocol::messages::{Message, ProtocolName};
pub use protocol::parser::{ParseError, StreamParser};
pub use protocol::DecodeError;
