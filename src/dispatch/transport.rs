//! Transport seam.
//!
//! The dispatcher only needs "send this request, give me the body text".
//! [`HttpTransport`] does it with `reqwest`; tests substitute their own.

use async_trait::async_trait;
use thiserror::Error;

use crate::dispatch::wire::{TransportKind, TransportRequest};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Sends one request and returns the response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, request: TransportRequest) -> Result<String, TransportError>;
}

/// HTTP transport over a shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rpc-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, request: TransportRequest) -> Result<String, TransportError> {
        let TransportRequest { kind, url, body, timeout } = request;
        let builder = match kind {
            TransportKind::Light => self.client.get(&url),
            TransportKind::Heavy => self
                .client
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.unwrap_or_default()),
        };

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout { url: url.clone() }
            } else {
                TransportError::Request {
                    url: url.clone(),
                    message: e.to_string(),
                }
            }
        };

        let response = builder.timeout(timeout).send().await.map_err(map_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(map_err)
    }
}
