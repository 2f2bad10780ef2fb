//! Block2 (RFC 7959) download loop: used by `GET` and `FETCH` continuation.

use coap::options::{decode_uint, encode_uint, find, number};
use coap::ContentFormat;
use transport::{RequestOptions, Transport};

use crate::request::{exchange, new_message};
use crate::Error;

/// Drives a download (§4.7.2): sends `initial_payload` as the first
/// request body, then follows any Block2 option in the response with
/// Block2-only continuation requests until `more=false`, concatenating
/// payloads in block order.
pub async fn block2_download(
    transport: &mut dyn Transport,
    code: coap::Code,
    initial_payload: &[u8],
    token: Vec<u8>,
    opts: &RequestOptions,
) -> Result<coap::Message, Error> {
    let mut message = new_message(code, token.clone());
    if code == coap::Code::FETCH {
        message
            .options
            .push((number::CONTENT_FORMAT, encode_uint(u32::from(ContentFormat::YangInstancesCbor.as_u16()))));
    }
    message
        .options
        .push((number::ACCEPT, encode_uint(u32::from(ContentFormat::YangDataCborSid.as_u16()))));
    message.payload = initial_payload.to_vec();

    let response = exchange(transport, message, opts.request_timeout).await?;

    let Some(block2_value) = find(&response.options, number::BLOCK2) else {
        return Ok(response);
    };

    let mut block = coap::decode_block(decode_uint(block2_value));
    let mut accumulated = response.payload.clone();
    let mut last_response = response;

    while block.more {
        let next_num = block.num + 1;
        let mut message = new_message(code, token.clone());
        message
            .options
            .push((number::BLOCK2, encode_uint(coap::encode_block(next_num, false, block.szx))));

        tracing::debug!(block_num = next_num, szx = block.szx, "requesting block2 continuation");
        let response = exchange(transport, message, opts.request_timeout).await?;

        let Some(value) = find(&response.options, number::BLOCK2) else {
            return Err(Error::Protocol(format!(
                "block2 continuation response for block {next_num} carried no Block2 option"
            )));
        };
        let echoed = coap::decode_block(decode_uint(value));
        if echoed.num != next_num {
            return Err(Error::Protocol(format!(
                "block2 num mismatch: requested {next_num}, device sent {}",
                echoed.num
            )));
        }
        if echoed.szx > block.szx {
            return Err(Error::Protocol(format!(
                "block2 szx increased: previous {}, device echoed {}",
                block.szx, echoed.szx
            )));
        }

        accumulated.extend_from_slice(&response.payload);
        block = echoed;
        last_response = response;
    }

    last_response.payload = accumulated;
    Ok(last_response)
}
