/// Failures raised by a [`crate::Transport`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("operation attempted before connect() succeeded")]
    NotConnected,
    #[error("board readiness precondition violated (no ANNOUNCE observed)")]
    NotReady,
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no matching response within the request deadline")]
    Timeout,
    #[error("transport closed while a request was in flight")]
    Disconnected,
    #[error("malformed coap response: {0}")]
    CoapDecode(#[from] coap::DecodeError),
    #[error("failed to open serial port: {0}")]
    SerialOpen(#[from] serialport::Error),
}
