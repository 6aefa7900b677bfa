//! Canonical serialization of sensor records
//!
//! The digest of a record is only meaningful if serialization is
//! deterministic: identical logical content must always produce identical
//! bytes. `CanonicalRecord` declares its fields in lexicographic order and
//! uses `BTreeMap` for all mappings, so compact JSON output is canonical by
//! construction. The one remaining hazard is non-finite floats, which
//! serde_json silently emits as `null`; those are rejected here before
//! serialization.

use edgestamp_types::{CanonicalRecord, Scalar, SensorValue};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Non-finite number in field '{field}'")]
    NonFinite { field: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Serialize a record into its canonical byte form.
///
/// Output is compact JSON with lexicographic key order. Fails with
/// `EncodingError::NonFinite` if the value or metadata contains NaN or an
/// infinity.
pub fn canonical_bytes(record: &CanonicalRecord) -> Result<Vec<u8>, EncodingError> {
    ensure_finite_value(&record.value)?;
    ensure_finite_map(&record.metadata, "metadata")?;
    Ok(serde_json::to_vec(record)?)
}

fn ensure_finite_value(value: &SensorValue) -> Result<(), EncodingError> {
    match value {
        SensorValue::Scalar(s) => ensure_finite_scalar(s, "value"),
        SensorValue::Mapping(map) => ensure_finite_map(map, "value"),
    }
}

fn ensure_finite_map(map: &BTreeMap<String, Scalar>, field: &str) -> Result<(), EncodingError> {
    for (key, scalar) in map {
        ensure_finite_scalar(scalar, &format!("{field}.{key}"))?;
    }
    Ok(())
}

fn ensure_finite_scalar(scalar: &Scalar, field: &str) -> Result<(), EncodingError> {
    if scalar.is_finite() {
        Ok(())
    } else {
        Err(EncodingError::NonFinite {
            field: field.to_string(),
        })
    }
}
