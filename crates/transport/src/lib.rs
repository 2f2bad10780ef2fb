//! Serial and UDP transports carrying MUP1-framed CoAP traffic to a
//! VelocityDRIVE-SP device.
//!
//! Each transport (C4 serial, C5 UDP) implements the uniform [`Transport`]
//! contract (C3): connect/disconnect, an event stream, and a single-request
//! `send_request` operation that owns message-id-keyed pending-request
//! bookkeeping and per-request timeouts (C6). Block-wise transfer (C7) and
//! the upstream consumer API live one layer up, in the `engine` crate.

mod contract;
mod error;
mod inflight;
mod serial;
mod udp;

pub use contract::{Event, RequestOptions, SerialOptions, Transport, UdpOptions};
pub use error::Error;
pub use serial::SerialTransport;
pub use udp::UdpTransport;
