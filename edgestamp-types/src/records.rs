//! Record structures moving through the timestamping pipeline

use crate::primitives::{Digest, Scalar, SensorValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sensor reading frozen at submission time.
///
/// Field declaration order is lexicographic on purpose: the derived
/// serializer emits struct fields in declaration order, and canonical
/// serialization requires lexicographic key order. Keep new fields sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Generated identifier: `{sensor_type}_{unix_millis}`
    pub id: String,
    /// Caller-supplied metadata, size-bounded at submission
    pub metadata: BTreeMap<String, Scalar>,
    /// Sensor type label, e.g. `heart_rate`
    pub sensor_type: String,
    /// Creation instant, ISO-8601 UTC
    pub timestamp_request: String,
    /// The reading itself
    pub value: SensorValue,
}

/// Successful result from the remote timestamping service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampToken {
    /// Timestamp issued by the service
    pub issued_at: String,
    /// Opaque proof blob. The service may omit it; a record stored without
    /// a proof can never verify.
    pub proof: Option<String>,
}

/// A record that completed the pipeline: the original reading, the digest
/// that was timestamped, and the service's issued timestamp and proof.
///
/// The results collection owns these exclusively; readers always receive
/// clones so stored history cannot be mutated from outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedRecord {
    pub original: CanonicalRecord,
    pub digest: Digest,
    pub issued_at: String,
    pub proof: Option<String>,
}

impl VerifiedRecord {
    /// Whether a usable proof is attached. An empty proof string counts as
    /// absent.
    pub fn has_proof(&self) -> bool {
        self.proof.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CanonicalRecord {
        CanonicalRecord {
            id: "heart_rate_1700000000000".to_string(),
            metadata: BTreeMap::from([("unit".to_string(), Scalar::from("bpm"))]),
            sensor_type: "heart_rate".to_string(),
            timestamp_request: "2026-08-08T12:00:00.000000Z".to_string(),
            value: SensorValue::from(72),
        }
    }

    #[test]
    fn test_record_fields_serialize_in_lexicographic_order() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        let id_pos = json.find("\"id\"").unwrap();
        let metadata_pos = json.find("\"metadata\"").unwrap();
        let sensor_pos = json.find("\"sensor_type\"").unwrap();
        let ts_pos = json.find("\"timestamp_request\"").unwrap();
        let value_pos = json.find("\"value\"").unwrap();
        assert!(id_pos < metadata_pos);
        assert!(metadata_pos < sensor_pos);
        assert!(sensor_pos < ts_pos);
        assert!(ts_pos < value_pos);
    }

    #[test]
    fn test_has_proof() {
        let base = VerifiedRecord {
            original: sample_record(),
            digest: Digest::new([0u8; 32]),
            issued_at: "2026-08-08T12:00:01Z".to_string(),
            proof: Some("0xproof".to_string()),
        };
        assert!(base.has_proof());

        let empty = VerifiedRecord {
            proof: Some(String::new()),
            ..base.clone()
        };
        assert!(!empty.has_proof());

        let missing = VerifiedRecord {
            proof: None,
            ..base
        };
        assert!(!missing.has_proof());
    }

    #[test]
    fn test_verified_record_serde_roundtrip() {
        let record = VerifiedRecord {
            original: sample_record(),
            digest: Digest::new([7u8; 32]),
            issued_at: "2026-08-08T12:00:01Z".to_string(),
            proof: Some("proof-blob".to_string()),
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: VerifiedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }
}
