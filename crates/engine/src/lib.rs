//! CoAP request engine and block-wise (RFC 7959) upload/download
//! controllers.
//!
//! This crate sits above `transport`: it generates message ids and tokens,
//! drives the Block1 upload loop and Block2 download loop described in
//! §4.7, and exposes the upstream consumer API (`fetch`/`patch`/`put`/`get`)
//! that decodes CBOR payloads for callers.

mod api;
mod blockwise;
mod error;
mod request;

pub use api::{fetch, get, patch, put, GetResult, PatchEntry, PatchOutcome};
pub use blockwise::{block1_upload, block2_download};
pub use error::Error;
