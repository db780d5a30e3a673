//! Error types for the catalog client and synchronizer.
//!
//! # Design
//! `ApiError` is everything the remote side can do wrong: the request never
//! completed, the server answered with a non-200 status, or the payload did
//! not match the expected shape. `SyncError` adds the persistence phase so a
//! caller can tell "nothing changed, retry later" apart from "the fetched
//! data could not be committed".

use thiserror::Error;

use crate::store::StoreError;
use crate::transport::TransportError;

/// Longest body excerpt kept on a `Remote` error.
pub const BODY_SNIPPET_LEN: usize = 256;

/// Errors returned by `CatalogClient` parse methods and `RemoteClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request did not complete (network unreachable, timeout, ...).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with something other than 200.
    #[error("HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// The response body could not be decoded into the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),
}

impl ApiError {
    pub(crate) fn remote(status: u16, body: &str) -> Self {
        ApiError::Remote {
            status,
            body: snippet(body),
        }
    }

    /// `true` when the server reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Remote { status: 404, .. })
    }
}

/// Errors returned by `Synchronizer::refresh`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching the listing failed; the store was not touched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] ApiError),

    /// The fetched listing could not be committed; the store rolled back.
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

fn snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
