//! SDK facade tying the pipeline, HTTP client, and verification together

use crate::config::SdkConfig;
use crate::pipeline::{NoopObserver, Pipeline, PipelineObserver, QueueItem};
use crate::remote::{HttpTimestampClient, TimestampService};
use crate::{Result, SdkError};
use chrono::{SecondsFormat, Utc};
use edgestamp_core::{canonical_bytes, digest_bytes, verify_record};
use edgestamp_types::{CanonicalRecord, Scalar, SensorValue, VerifiedRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read-only snapshot of pipeline state.
#[derive(Debug, Clone, Serialize)]
pub struct SdkStatus {
    /// Readings currently waiting in the queue
    pub pending_requests: usize,
    /// Readings timestamped and stored
    pub processed_count: usize,
    /// Host platform identifier
    pub platform: &'static str,
    /// Whether the queue is at capacity right now
    pub queue_full: bool,
}

/// Build a canonical record for a reading captured now.
///
/// The identifier embeds the submission instant in milliseconds; the request
/// timestamp is the same instant in ISO-8601 form. Both are frozen here so
/// canonicalization stays reproducible for the record's whole life.
pub fn new_record(
    sensor_type: &str,
    value: SensorValue,
    metadata: BTreeMap<String, Scalar>,
) -> CanonicalRecord {
    let now = Utc::now();
    CanonicalRecord {
        id: format!("{sensor_type}_{}", now.timestamp_millis()),
        metadata,
        sensor_type: sensor_type.to_string(),
        timestamp_request: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        value,
    }
}

/// Client SDK for tamper-evident timestamping of wearable sensor readings.
///
/// Construction spawns the background worker, so a tokio runtime must be
/// running. One instance owns one queue, one worker, and one results
/// collection; drop it only after [`shutdown`](Self::shutdown).
pub struct EdgeStampSdk {
    config: SdkConfig,
    pipeline: Pipeline,
}

impl EdgeStampSdk {
    /// Create an SDK instance talking to the real timestamp service.
    pub fn new(config: SdkConfig) -> Result<Self> {
        let client = HttpTimestampClient::new(
            &config.base_url,
            &config.api_key,
            config.connect_timeout,
            config.request_timeout,
        )?;
        Self::with_service(config, Arc::new(client), Arc::new(NoopObserver))
    }

    /// Create an SDK instance with an injected timestamp service and
    /// observer. This is the seam used by tests and by hosts that need
    /// custom transports or drop-event visibility.
    pub fn with_service(
        config: SdkConfig,
        service: Arc<dyn TimestampService>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(SdkError::Configuration("API key is required".to_string()));
        }

        let pipeline = Pipeline::spawn(&config, service, observer);
        Ok(Self { config, pipeline })
    }

    /// Record a sensor reading for timestamping. Returns the generated
    /// record identifier.
    ///
    /// Fails synchronously with `Validation` when serialized metadata
    /// exceeds the configured cap, `Encoding` for non-finite numeric values,
    /// and `QueueOverflow` when the pipeline is at capacity. Asynchronous
    /// remote failures are never reported here.
    pub fn record(
        &self,
        sensor_type: &str,
        value: impl Into<SensorValue>,
        metadata: Option<BTreeMap<String, Scalar>>,
    ) -> Result<String> {
        let metadata = metadata.unwrap_or_default();

        let serialized_len = serde_json::to_vec(&metadata)
            .map_err(|e| SdkError::Validation(format!("Unserializable metadata: {e}")))?
            .len();
        if serialized_len > self.config.metadata_limit {
            return Err(SdkError::Validation(format!(
                "Metadata too large: {serialized_len} bytes exceeds the {} byte limit",
                self.config.metadata_limit
            )));
        }

        let record = new_record(sensor_type, value.into(), metadata);
        let bytes = canonical_bytes(&record)?;
        let digest = digest_bytes(&bytes);

        let id = record.id.clone();
        self.pipeline.submit(QueueItem {
            id: id.clone(),
            digest,
            record,
            retry_count: 0,
        })?;

        Ok(id)
    }

    /// Snapshot of all timestamped records. Safe to iterate and mutate
    /// freely; entries are clones of the stored history.
    pub fn verified(&self) -> Vec<VerifiedRecord> {
        self.pipeline.verified()
    }

    /// Check a stored record's integrity locally. True only if a proof is
    /// present and the original payload still hashes to the stored digest.
    pub fn verify(&self, record: &VerifiedRecord) -> bool {
        verify_record(record)
    }

    /// Current pipeline state. Pure read, always succeeds.
    pub fn status(&self) -> SdkStatus {
        SdkStatus {
            pending_requests: self.pipeline.pending(),
            processed_count: self.pipeline.processed(),
            platform: std::env::consts::OS,
            queue_full: self.pipeline.is_full(),
        }
    }

    /// Stop the background worker, waiting up to the configured shutdown
    /// budget. Submissions after this fail with `QueueOverflow`.
    pub async fn shutdown(&self) {
        self.pipeline.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_shape() {
        let record = new_record("heart_rate", SensorValue::from(72), BTreeMap::new());
        assert!(record.id.starts_with("heart_rate_"));
        assert_eq!(record.sensor_type, "heart_rate");
        assert_eq!(record.value, SensorValue::from(72));
        // ISO-8601 UTC with explicit offset
        assert!(record.timestamp_request.ends_with('Z'));
    }

    #[test]
    fn test_record_id_embeds_millis() {
        let record = new_record("spo2", SensorValue::from(98), BTreeMap::new());
        let suffix = record.id.strip_prefix("spo2_").unwrap();
        let millis: i64 = suffix.parse().unwrap();
        assert!(millis > 1_600_000_000_000); // after 2020
    }
}
