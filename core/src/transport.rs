//! Async transport seam between the pure client and the network.
//!
//! `Transport` executes one `HttpRequest` and hands back the raw
//! `HttpResponse`. Status interpretation stays in `CatalogClient`, so a
//! transport must return 4xx/5xx responses as data rather than as errors.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::http::{HttpRequest, HttpResponse};

/// The request never produced a response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by `Transport::execute`.
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = TransportResult<HttpResponse>> + Send + 'a>>;

/// Executes catalog requests.
///
/// Implementations must be safe to share between a running refresh and
/// concurrent detail fetches.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport. `timeout` of `None` leaves requests unbounded.
    pub fn new(timeout: Option<Duration>) -> TransportResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { http })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let mut builder = self.http.get(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder.send().await.map_err(classify)?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.text().await.map_err(classify)?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
