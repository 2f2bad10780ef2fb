//! Upstream consumer API (§6): `fetch`, `patch`, `put`, `get`, each driving
//! the block-wise controllers and decoding the result as CBOR.

use serde::Serialize;
use transport::{RequestOptions, Transport};

use crate::blockwise::{block1_upload, block2_download};
use crate::request::resolve_token;
use crate::Error;

/// One entry of a `patch()` call: a YANG path and its replacement value.
#[derive(Clone, Debug, Serialize)]
pub struct PatchEntry {
    pub path: String,
    pub value: serde_cbor::Value,
}

/// Per-entry outcome of a `patch()` call.
#[derive(Clone, Debug)]
pub struct PatchOutcome {
    pub path: String,
    pub result: Result<(), String>,
}

/// The assembled result of a full-datastore `get()`.
#[derive(Clone, Debug)]
pub struct GetResult {
    pub bytes: Vec<u8>,
    pub decoded: serde_cbor::Value,
}

impl GetResult {
    #[must_use]
    pub fn byte_count(&self) -> usize {
        self.bytes.len()
    }
}

/// Builds a FETCH query for `paths`, applies block-wise as needed, and
/// decodes the assembled response as CBOR.
pub async fn fetch(
    transport: &mut dyn Transport,
    paths: &[String],
    opts: &RequestOptions,
) -> Result<serde_cbor::Value, Error> {
    let query = serde_cbor::to_vec(paths)?;
    let token = resolve_token(opts);
    let response = block2_download(transport, coap::Code::FETCH, &query, token, opts).await?;
    serde_cbor::from_slice(&response.payload).map_err(Error::from)
}

/// Sends one iPATCH per entry in `patches`, aggregating per-entry outcomes.
pub async fn patch(
    transport: &mut dyn Transport,
    patches: &[PatchEntry],
    opts: &RequestOptions,
) -> Result<Vec<PatchOutcome>, Error> {
    let mut outcomes = Vec::with_capacity(patches.len());
    for entry in patches {
        let payload = serde_cbor::to_vec(entry)?;
        let token = resolve_token(opts);
        let result = block1_upload(transport, coap::Code::IPATCH, &payload, token, opts).await;
        outcomes.push(PatchOutcome {
            path: entry.path.clone(),
            result: result.map(|_| ()).map_err(|e| e.to_string()),
        });
    }
    Ok(outcomes)
}

/// Bulk-replaces the full resource at `Uri-Path="c"` with `payload`.
pub async fn put(
    transport: &mut dyn Transport,
    payload: &[u8],
    opts: &RequestOptions,
) -> Result<(), Error> {
    let token = resolve_token(opts);
    block1_upload(transport, coap::Code::PUT, payload, token, opts).await?;
    Ok(())
}

/// Retrieves the full datastore via block-wise GET, returning both the raw
/// assembled bytes and the CBOR-decoded form.
pub async fn get(transport: &mut dyn Transport, opts: &RequestOptions) -> Result<GetResult, Error> {
    let token = resolve_token(opts);
    let response = block2_download(transport, coap::Code::GET, &[], token, opts).await?;
    let decoded = serde_cbor::from_slice(&response.payload)?;
    Ok(GetResult { bytes: response.payload, decoded })
}
