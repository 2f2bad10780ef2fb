//! MUP1 (Microchip UART Protocol 1) frame codec.
//!
//! MUP1 frames a byte stream into discrete messages: a start marker (`>`), a
//! one-byte type, a byte-stuffed payload, an end marker (`<`, doubled when
//! the payload length is even), and a four-hex-digit RFC 1071 checksum over
//! the unescaped frame. This crate only encodes and decodes frames; it knows
//! nothing about UART or UDP transport, or about what's inside a CoAP
//! payload.
//!
//! - [`build`] constructs the wire bytes for one frame.
//! - [`Reassembler`] consumes an arbitrary byte stream and yields complete,
//!   checksum-valid frames, silently resyncing past corruption.

mod checksum;
mod escape;
mod frame;
mod reassembler;

pub use checksum::{checksum16, format_checksum, parse_checksum};
pub use escape::{escape, find_unescaped_lt, unescape};
pub use frame::{build, Frame, FrameKind};
pub use reassembler::Reassembler;
