//! Shared types for the edgestamp SDK
//!
//! This crate defines the value model, digest type, and record structures
//! used throughout the wearable timestamping pipeline.

pub mod error;
pub mod primitives;
pub mod records;

pub use error::{Error, Result};
pub use primitives::{Digest, Scalar, SensorValue};
pub use records::{CanonicalRecord, TimestampToken, VerifiedRecord};
