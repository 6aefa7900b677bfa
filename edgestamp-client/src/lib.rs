//! Edgestamp Client Library
//!
//! Client SDK for tamper-evident timestamping of wearable sensor readings:
//! readings are canonicalized and hashed locally, digests are submitted to a
//! remote timestamping service by a background worker over a bounded queue,
//! and stored results can be verified locally at any time.

pub mod config;
pub mod pipeline;
pub mod remote;
pub mod sdk;

pub use config::{load_api_key, SdkConfig};
pub use pipeline::{DropReason, PipelineObserver};
pub use remote::{HttpTimestampClient, RemoteError, TimestampService};
pub use sdk::{EdgeStampSdk, SdkStatus};

use edgestamp_core::EncodingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timestamp queue full")]
    QueueOverflow,

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

pub type Result<T> = std::result::Result<T, SdkError>;
