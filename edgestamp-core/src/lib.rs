//! Pure core functions for the edgestamp timestamping pipeline
//!
//! This crate provides:
//! - Canonical (deterministic) serialization of sensor records
//! - SHA3-256 content hashing
//! - Local integrity verification of stored records
//!
//! Everything here is synchronous and side-effect free; network and
//! concurrency concerns live in `edgestamp-client`.

pub mod canonical;
pub mod hash;
pub mod verify;

pub use canonical::{canonical_bytes, EncodingError};
pub use hash::digest_bytes;
pub use verify::verify_record;
