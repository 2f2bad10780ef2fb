//! Block1 (RFC 7959) upload loop: used by `iPATCH` and `PUT`.

use coap::options::{decode_uint, encode_uint, find, number};
use coap::ContentFormat;
use transport::{RequestOptions, Transport};

use crate::request::{exchange, new_message};
use crate::Error;

/// Drives an upload (§4.7.1): a single plain request when the payload fits
/// in one block, otherwise a Block1 loop that renegotiates `szx` downward
/// if the device asks for smaller blocks.
pub async fn block1_upload(
    transport: &mut dyn Transport,
    code: coap::Code,
    payload: &[u8],
    token: Vec<u8>,
    opts: &RequestOptions,
) -> Result<coap::Message, Error> {
    let mut szx = opts.block_size_exponent;
    let mut block_size = 1usize << (szx + 4);

    if payload.len() <= block_size {
        let mut message = new_message(code, token);
        message.options.push((number::CONTENT_FORMAT, encode_uint(u32::from(ContentFormat::YangInstancesCbor.as_u16()))));
        message.options.push((number::ACCEPT, encode_uint(u32::from(ContentFormat::YangDataCborSid.as_u16()))));
        message.payload = payload.to_vec();
        let response = exchange(transport, message, opts.request_timeout).await?;
        if !response.code.is_success() {
            return Err(Error::Device { code: response.code.to_string() });
        }
        return Ok(response);
    }

    let total = payload.len();
    let mut offset = 0usize;
    let mut block_num = 0u32;

    loop {
        let chunk_end = (offset + block_size).min(total);
        let chunk = &payload[offset..chunk_end];
        let more = chunk_end < total;

        let mut message = new_message(code, token.clone());
        message.options.push((number::CONTENT_FORMAT, encode_uint(u32::from(ContentFormat::YangInstancesCbor.as_u16()))));
        message.options.push((number::ACCEPT, encode_uint(u32::from(ContentFormat::YangDataCborSid.as_u16()))));
        message
            .options
            .push((number::BLOCK1, encode_uint(coap::encode_block(block_num, more, szx))));
        message.payload = chunk.to_vec();

        tracing::debug!(block_num, szx, more, "sending block1 chunk");
        let response = exchange(transport, message, opts.request_timeout).await?;

        if more {
            if response.code != coap::Code::CONTINUE {
                return Err(Error::Protocol(format!(
                    "expected 2.31 Continue for block1 chunk {block_num}, got {}",
                    response.code
                )));
            }
        } else if !response.code.is_success() {
            return Err(Error::Device { code: response.code.to_string() });
        }

        if let Some(value) = find(&response.options, number::BLOCK1) {
            let echoed = coap::decode_block(decode_uint(value));
            if echoed.num != block_num {
                return Err(Error::Protocol(format!(
                    "block1 num mismatch: sent {block_num}, device echoed {}",
                    echoed.num
                )));
            }
            if echoed.szx < szx {
                tracing::debug!(from = szx, to = echoed.szx, "block1 szx renegotiated down");
                szx = echoed.szx;
                block_size = 1usize << (szx + 4);
            } else if echoed.szx > szx {
                return Err(Error::Protocol(format!(
                    "block1 szx increased: sent {szx}, device echoed {}",
                    echoed.szx
                )));
            }
        }

        if !more {
            return Ok(response);
        }
        offset = chunk_end;
        block_num += 1;
    }
}
