//! Protocol module containing message types, the binary codec, and the
//! incremental stream parser.

pub mod codec;
pub mod messages;
pub mod parser;
pub mod wire;

pub use codec::{decode_handshake, decode_payload, encode_frame, encode_payload};
pub use messages::*;
pub use parser::{ParseError, StreamParser};
pub use wire::DecodeError;
