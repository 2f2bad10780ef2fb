//! CoAP message header, encode/decode, and the method/response codes this
//! client uses (RFC 7252 §3, plus the FETCH/PATCH/iPATCH methods of
//! RFC 8132 that VelocityDRIVE-SP relies on for YANG datastore access).

use crate::error::DecodeError;
use crate::options::{decode_options, encode_options};

const VERSION: u8 = 1;
const HEADER_SIZE: usize = 4;
const MAX_TOKEN_LEN: u8 = 8;

/// The CoAP message type (RFC 7252 §3), carried in the header's `T` bits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Type {
    Confirmable = 0,
    NonConfirmable = 1,
    Acknowledgement = 2,
    Reset = 3,
}

impl Type {
    const fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Self::Confirmable,
            1 => Self::NonConfirmable,
            2 => Self::Acknowledgement,
            _ => Self::Reset,
        }
    }
}

/// A CoAP method or response code, packed as `(class << 5) | detail`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Code(pub u8);

impl Code {
    #[must_use]
    pub const fn new(class: u8, detail: u8) -> Self {
        Self((class << 5) | (detail & 0b1_1111))
    }

    #[must_use]
    pub const fn class(self) -> u8 {
        self.0 >> 5
    }

    #[must_use]
    pub const fn detail(self) -> u8 {
        self.0 & 0b1_1111
    }

    /// `true` for any `2.xx` response code.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.class() == 2
    }

    pub const GET: Self = Self::new(0, 1);
    pub const POST: Self = Self::new(0, 2);
    pub const PUT: Self = Self::new(0, 3);
    pub const DELETE: Self = Self::new(0, 4);
    pub const FETCH: Self = Self::new(0, 5);
    pub const PATCH: Self = Self::new(0, 6);
    pub const IPATCH: Self = Self::new(0, 7);

    pub const CREATED: Self = Self::new(2, 1);
    pub const CHANGED: Self = Self::new(2, 4);
    pub const CONTENT: Self = Self::new(2, 5);
    pub const CONTINUE: Self = Self::new(2, 31);
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.class(), self.detail())
    }
}

/// A decoded or to-be-encoded CoAP message.
///
/// Options are kept as raw `(number, value)` pairs in ascending order, as
/// produced by [`decode`] and consumed by [`encode`]; [`crate::options`]
/// provides typed accessors for the option numbers this client cares about.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    pub msg_type: Type,
    pub code: Code,
    pub message_id: u16,
    pub token: Vec<u8>,
    pub options: Vec<(u16, Vec<u8>)>,
    pub payload: Vec<u8>,
}

/// Serializes `message` into its wire bytes.
#[must_use]
pub fn encode(message: &Message) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + message.token.len() + message.payload.len());

    let token_len = message.token.len() as u8;
    out.push((VERSION << 6) | ((message.msg_type as u8) << 4) | token_len);
    out.push(message.code.0);
    out.extend_from_slice(&message.message_id.to_be_bytes());
    out.extend_from_slice(&message.token);
    out.extend(encode_options(&message.options));

    if !message.payload.is_empty() {
        out.push(0xFF);
        out.extend_from_slice(&message.payload);
    }

    tracing::debug!(
        code = %message.code,
        message_id = message.message_id,
        options = message.options.len(),
        payload_len = message.payload.len(),
        "encoded coap message"
    );
    out
}

/// Parses `bytes` into a [`Message`], validating the header, token length,
/// and option TLV structure.
pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DecodeError::Truncated { len: bytes.len() });
    }

    let version = bytes[0] >> 6;
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion { version });
    }
    let msg_type = Type::from_bits((bytes[0] >> 4) & 0b11);
    let token_len = bytes[0] & 0b1111;
    if token_len > MAX_TOKEN_LEN {
        return Err(DecodeError::TokenTooLong { token_len });
    }

    let code = Code(bytes[1]);
    let message_id = u16::from_be_bytes([bytes[2], bytes[3]]);

    let token_end = HEADER_SIZE + token_len as usize;
    let token = bytes
        .get(HEADER_SIZE..token_end)
        .ok_or(DecodeError::TokenTruncated)?
        .to_vec();

    let (options, payload) = decode_options(&bytes[token_end..])?;

    tracing::debug!(%code, message_id, options = options.len(), "decoded coap message");
    Ok(Message {
        msg_type,
        code,
        message_id,
        token,
        options,
        payload: payload.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(token: Vec<u8>, options: Vec<(u16, Vec<u8>)>, payload: Vec<u8>) -> Message {
        Message {
            msg_type: Type::Confirmable,
            code: Code::GET,
            message_id: 0x1234,
            token,
            options,
            payload,
        }
    }

    #[test]
    fn round_trips_request_with_options_and_payload() {
        let message = sample(
            vec![1, 2, 3],
            vec![(11, b"c".to_vec()), (12, vec![0, 140])],
            b"payload".to_vec(),
        );
        let encoded = encode(&message);
        assert_eq!(decode(&encoded).unwrap(), message);
    }

    #[test]
    fn round_trips_empty_message() {
        let message = sample(Vec::new(), Vec::new(), Vec::new());
        assert_eq!(decode(&encode(&message)).unwrap(), message);
    }

    #[test]
    fn rejects_truncated_header() {
        assert_eq!(decode(&[0x40, 0x01]), Err(DecodeError::Truncated { len: 2 }));
    }

    #[test]
    fn rejects_unsupported_version() {
        let bytes = [0b0000_0000, 0x01, 0x00, 0x00];
        assert_eq!(decode(&bytes), Err(DecodeError::UnsupportedVersion { version: 0 }));
    }

    #[test]
    fn rejects_token_longer_than_header_claims() {
        let bytes = [0b0100_1000, 0x01, 0x00, 0x00, 0x01, 0x02];
        assert_eq!(decode(&bytes), Err(DecodeError::TokenTruncated));
    }

    #[test]
    fn code_formats_as_class_dot_detail() {
        assert_eq!(Code::CONTINUE.to_string(), "2.31");
        assert_eq!(Code::CHANGED.to_string(), "2.04");
    }

    proptest! {
        #[test]
        fn round_trips_arbitrary_token_and_payload(
            token in proptest::collection::vec(any::<u8>(), 0..=8),
            payload in proptest::collection::vec(any::<u8>(), 0..2048),
        ) {
            let message = sample(token, vec![(11, b"c".to_vec())], payload);
            prop_assert_eq!(decode(&encode(&message)).unwrap(), message);
        }

        #[test]
        fn round_trips_up_to_sixteen_options(
            deltas in proptest::collection::vec(1u16..50, 0..=16),
            payload in proptest::collection::vec(any::<u8>(), 0..2048),
        ) {
            let mut number = 0u16;
            let options: Vec<(u16, Vec<u8>)> = deltas
                .into_iter()
                .map(|delta| {
                    number += delta;
                    (number, vec![(number % 256) as u8; 2])
                })
                .collect();
            let message = sample(vec![0xAB, 0xCD], options, payload);
            prop_assert_eq!(decode(&encode(&message)).unwrap(), message);
        }
    }
}
