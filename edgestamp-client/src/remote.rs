//! HTTP client for the remote timestamping service

use crate::{Result, SdkError};
use async_trait::async_trait;
use edgestamp_types::{Digest, TimestampToken};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failures talking to the timestamp service. These never reach the
/// submitting caller; the pipeline turns each one into a retry or a drop.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Service returned status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// A service that can timestamp a digest.
///
/// The production implementation is [`HttpTimestampClient`]; tests inject
/// scripted implementations. No implementation retries internally — retry
/// policy belongs to the pipeline.
#[async_trait]
pub trait TimestampService: Send + Sync {
    async fn submit(&self, digest: &Digest) -> std::result::Result<TimestampToken, RemoteError>;
}

/// Success body from the timestamp endpoint. Unknown fields are ignored;
/// `proof` may legitimately be absent.
#[derive(Debug, Deserialize)]
struct StampResponseBody {
    timestamp: Option<String>,
    proof: Option<String>,
}

/// HTTP client for the timestamp service.
pub struct HttpTimestampClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTimestampClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            SdkError::Configuration("API key contains invalid header characters".to_string())
        })?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(format!(
                "edgestamp/{} ({})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ))
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| SdkError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl TimestampService for HttpTimestampClient {
    async fn submit(&self, digest: &Digest) -> std::result::Result<TimestampToken, RemoteError> {
        let response = self
            .http
            .post(format!("{}/v1/timestamp", self.base_url))
            .json(&serde_json::json!({ "hash": digest.to_hex() }))
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body: StampResponseBody = response
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;

        let issued_at = body
            .timestamp
            .ok_or_else(|| RemoteError::MalformedResponse("missing timestamp field".to_string()))?;

        debug!(%digest, %issued_at, "timestamp issued");

        Ok(TimestampToken {
            issued_at,
            proof: body.proof,
        })
    }
}

fn classify_send_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Network(err.to_string())
    }
}
