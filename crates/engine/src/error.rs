/// Errors raised by the request engine and block-wise controllers.
///
/// Wraps the lower-layer [`transport::Error`] via `#[from]` so callers
/// matching on `engine::Error` see `CoapDecode`/timeout/disconnect variants
/// without manual conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] transport::Error),

    #[error("block-wise protocol invariant violated: {0}")]
    Protocol(String),

    #[error("device rejected the final block with response code {code}")]
    Device { code: String },

    #[error("failed to cbor-encode request payload: {0}")]
    CborEncode(#[from] serde_cbor::Error),
}
