use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;

/// `connect()` options for the serial transport (C4).
#[derive(Clone, Debug)]
pub struct SerialOptions {
    pub device: PathBuf,
    pub baud_rate: u32,
}

impl SerialOptions {
    #[must_use]
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            baud_rate: 115_200,
        }
    }
}

/// `connect()` options for the UDP transport (C5).
#[derive(Clone, Debug)]
pub struct UdpOptions {
    pub host: String,
    pub port: u16,
}

impl UdpOptions {
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 5683,
        }
    }
}

/// Options consumed uniformly by every request a transport issues.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    /// CoAP token. `None` means "generate a random 2-byte token".
    pub token: Option<Vec<u8>>,
    /// Block size exponent (`0..=6`); block size is `1 << (szx + 4)` bytes.
    pub block_size_exponent: u8,
    pub request_timeout: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            token: None,
            block_size_exponent: 6,
            request_timeout: Duration::from_millis(30_000),
        }
    }
}

/// Event emitted by a transport's inbound path, independent of any specific
/// in-flight request.
#[derive(Clone, Debug)]
pub enum Event {
    Connected,
    Disconnected,
    Announce,
    /// A `'T'` trace frame's payload, decoded as UTF-8 (lossily).
    Trace(String),
    /// A CoAP message that arrived with no matching pending request.
    Response(coap::Message),
}

/// The uniform contract implemented by the serial (C4) and UDP (C5)
/// transports.
///
/// Each transport instance is a single-threaded cooperative agent: the
/// pending-request table, the MUP1 reassembly buffer, and the wire handle
/// are owned exclusively by the transport's background task. Callers only
/// ever see the surface below.
#[async_trait]
pub trait Transport: Send {
    async fn connect(&mut self) -> Result<(), Error>;

    /// Rejects every pending request with [`Error::Disconnected`] and clears
    /// the reassembly buffer.
    async fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// `true` once an ANNOUNCE frame has been observed (serial) or
    /// immediately after `connect()` (UDP).
    fn board_ready(&self) -> bool;

    /// Resolves once [`Self::board_ready`] becomes true, or rejects with
    /// [`Error::Timeout`] after `timeout` elapses.
    async fn wait_for_ready(&mut self, timeout: Duration) -> Result<(), Error>;

    /// Subscribes to this transport's event stream.
    fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event>;

    /// Issues a single CoAP exchange: encodes `message`, wraps it in a MUP1
    /// `'c'` frame, writes it, and awaits either a matching response, the
    /// request's own timeout, or transport closure.
    ///
    /// `message.message_id` must already be set by the caller; the engine
    /// crate owns message-id generation so that block-wise transfers can
    /// keep a single token across many distinct ids.
    async fn send_request(
        &mut self,
        message: coap::Message,
        timeout: Duration,
    ) -> Result<coap::Message, Error>;
}
