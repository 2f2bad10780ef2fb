//! CoAP (RFC 7252) message codec with RFC 7959 block-wise option packing.
//!
//! This crate only encodes and decodes CoAP messages and the Block1/Block2
//! option values carried inside them; it has no notion of a transport, a
//! request/response lifecycle, or a block-wise transfer loop — those live in
//! `transport` and `engine`.

mod block;
mod content_format;
mod error;
mod message;
pub mod options;

pub use block::{decode_block, encode_block, Block, MAX_SZX};
pub use content_format::ContentFormat;
pub use error::DecodeError;
pub use message::{decode, encode, Code, Message, Type};
