//! SDK configuration and credential loading

use crate::{Result, SdkError};
use std::path::Path;
use std::time::Duration;

/// Default timestamp service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.edgestamp.io";

/// Environment variable consulted for the API key.
pub const API_KEY_ENV: &str = "EDGESTAMP_API_KEY";

/// Configuration for the SDK and its timestamping pipeline.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Base URL of the timestamp service
    pub base_url: String,
    /// Bearer token for the timestamp service
    pub api_key: String,
    /// Maximum number of readings waiting for timestamping
    pub queue_capacity: usize,
    /// Retries after the initial attempt before an item is dropped
    pub max_retries: u32,
    /// TCP connect timeout for timestamp requests
    pub connect_timeout: Duration,
    /// Total per-request timeout for timestamp requests
    pub request_timeout: Duration,
    /// How long the worker waits on an empty queue before re-checking the
    /// stop signal
    pub poll_interval: Duration,
    /// How long shutdown waits for the worker before proceeding anyway
    pub shutdown_wait: Duration,
    /// Maximum serialized metadata size in bytes
    pub metadata_limit: usize,
}

impl SdkConfig {
    /// Create a configuration with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            queue_capacity: 100,
            max_retries: 2,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
            shutdown_wait: Duration::from_secs(2),
            metadata_limit: 1024,
        }
    }

    /// Create a configuration with the API key loaded from the environment.
    pub fn from_env() -> Result<Self> {
        let api_key = load_api_key(API_KEY_ENV, None)?;
        Ok(Self::new(api_key))
    }

    /// Set the timestamp service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the number of retries after the initial attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the connect and total request timeouts.
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Set the worker's empty-queue poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the bounded wait used by shutdown.
    pub fn with_shutdown_wait(mut self, wait: Duration) -> Self {
        self.shutdown_wait = wait;
        self
    }

    /// Set the serialized metadata size cap.
    pub fn with_metadata_limit(mut self, limit: usize) -> Self {
        self.metadata_limit = limit;
        self
    }
}

/// Load an API key from an environment variable, falling back to a key file.
///
/// Both sources are trimmed; blank values are treated as missing. Fails with
/// `SdkError::Configuration` when neither source yields a key.
pub fn load_api_key(env_var: &str, fallback_file: Option<&Path>) -> Result<String> {
    if let Ok(value) = std::env::var(env_var) {
        let key = value.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    if let Some(path) = fallback_file {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                SdkError::Configuration(format!("Failed to read key file {}: {e}", path.display()))
            })?;
            let key = content.trim();
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }
    }

    Err(SdkError::Configuration(format!(
        "API key not found: set {env_var} or provide a key file"
    )))
}
