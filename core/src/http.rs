//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe catalog requests and responses as plain data.
//! `CatalogClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network; a `Transport` executes the actual
//! round-trip. The catalog API is read-only, so every request is a GET and
//! no method field is carried.
//!
//! All fields use owned types (`String`, `Vec`) so values can be moved into
//! boxed transport futures without lifetime concerns.

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }
}

/// An HTTP response described as plain data.
///
/// Produced by a `Transport` after executing an `HttpRequest`, then passed
/// to `CatalogClient::parse_*` methods for status checking and decoding.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Convenience constructor used by transports and test doubles.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}
