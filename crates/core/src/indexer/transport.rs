//! The HTTP collaborator the engine hands requests to.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::types::IndexerRequest;

/// Raw response body and status for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors that can occur performing a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited by indexer, retry in {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            TransportError::Timeout => "timeout",
            TransportError::ConnectionFailed(_) => "connection_failed",
            TransportError::HttpStatus { .. } => "http_status",
            TransportError::RateLimited { .. } => "rate_limited",
            TransportError::Cancelled => "cancelled",
            TransportError::Other(_) => "transport_error",
        }
    }

    /// Error for a non-2xx response, keeping a short body excerpt.
    pub fn from_response(response: &TransportResponse) -> Self {
        TransportError::HttpStatus {
            status: response.status,
            body: response.body.chars().take(200).collect(),
        }
    }
}

/// Performs the HTTP call for an [`IndexerRequest`].
///
/// Retry and backoff for transport failures belong to implementations; the
/// engine only sees the final outcome.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &IndexerRequest) -> Result<TransportResponse, TransportError>;
}

/// `reqwest` backed transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quarry/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &IndexerRequest) -> Result<TransportResponse, TransportError> {
        debug!(indexer = %request.indexer, url = %request.redacted_url(), "HTTP request");

        let response = self
            .client
            .get(request.full_url())
            .header(header::ACCEPT, request.accept.mime())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else if e.is_connect() {
                    TransportError::ConnectionFailed(e.to_string())
                } else {
                    TransportError::Other(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(0);
            return Err(TransportError::RateLimited { retry_after_ms });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Other(e.to_string())
            }
        })?;

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}
