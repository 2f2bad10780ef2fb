//! Single-CoAP-exchange issuance: message-id generation and the default
//! random token, shared by the plain and block-wise request paths.

use std::time::Duration;

use rand::Rng;
use transport::{RequestOptions, Transport};

use crate::Error;

/// Generates a fresh message id, uniform over `u16` (§4.6).
pub(crate) fn generate_message_id() -> u16 {
    rand::thread_rng().gen()
}

/// Resolves the token to use for a (possibly block-wise) transfer: the
/// caller-supplied token, or a fresh random 2-byte one.
pub(crate) fn resolve_token(opts: &RequestOptions) -> Vec<u8> {
    opts.token.clone().unwrap_or_else(|| {
        let mut token = vec![0u8; 2];
        rand::thread_rng().fill(token.as_mut_slice());
        token
    })
}

/// Builds the common skeleton of a request: confirmable, `Uri-Path="c"`,
/// the given method code and token, message id left at `0` to be assigned
/// by [`exchange`].
pub(crate) fn new_message(code: coap::Code, token: Vec<u8>) -> coap::Message {
    coap::Message {
        msg_type: coap::Type::Confirmable,
        code,
        message_id: 0,
        token,
        options: vec![(coap::options::number::URI_PATH, b"c".to_vec())],
        payload: Vec::new(),
    }
}

/// Issues one CoAP request/response exchange over `transport`, assigning a
/// fresh message id before sending.
pub(crate) async fn exchange(
    transport: &mut dyn Transport,
    mut message: coap::Message,
    timeout: Duration,
) -> Result<coap::Message, Error> {
    message.message_id = generate_message_id();
    tracing::debug!(message_id = message.message_id, code = %message.code, "issuing coap request");
    transport.send_request(message, timeout).await.map_err(Error::from)
}
