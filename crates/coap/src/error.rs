/// Failures raised while decoding a CoAP message.
#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum DecodeError {
    #[error("message is {len} bytes, shorter than the 4-byte header")]
    Truncated { len: usize },
    #[error("unsupported CoAP version {version}")]
    UnsupportedVersion { version: u8 },
    #[error("token length {token_len} exceeds the maximum of 8")]
    TokenTooLong { token_len: u8 },
    #[error("message ends inside the token field")]
    TokenTruncated,
    #[error("option header ends before its delta/length extension bytes")]
    OptionTruncated,
    #[error("option delta or length nibble used the reserved value 0b1111")]
    ReservedOptionNibble,
    #[error("payload marker present but no payload bytes follow")]
    EmptyPayloadAfterMarker,
}
