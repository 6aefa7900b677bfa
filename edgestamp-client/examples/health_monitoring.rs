//! Health monitoring example: vital signs with tamper-evident timestamps
//!
//! Records simulated heart-rate and blood-oxygen readings, waits for the
//! pipeline to timestamp them, then verifies every stored record locally.
//!
//! Run with: EDGESTAMP_API_KEY=... cargo run --example health_monitoring

use edgestamp_client::{EdgeStampSdk, SdkConfig};
use edgestamp_types::Scalar;
use rand::Rng;
use std::collections::BTreeMap;
use std::time::Duration;

fn heart_rate_metadata(confidence: f64) -> BTreeMap<String, Scalar> {
    BTreeMap::from([
        ("unit".to_string(), "bpm".into()),
        ("sensor".to_string(), "PPG".into()),
        ("location".to_string(), "wrist".into()),
        ("confidence".to_string(), confidence.into()),
    ])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = SdkConfig::from_env()?;
    let sdk = EdgeStampSdk::new(config)?;

    println!("Starting health monitoring...");

    let mut rng = rand::thread_rng();
    for _ in 0..10 {
        let hr: i64 = rng.gen_range(60..=100);
        let hr_id = sdk.record("heart_rate", hr, Some(heart_rate_metadata(0.95)))?;
        println!("Recorded heart rate: {hr} bpm ({hr_id})");

        let spo2: i64 = rng.gen_range(95..=100);
        let spo2_id = sdk.record(
            "blood_oxygen",
            spo2,
            Some(BTreeMap::from([("unit".to_string(), "percent".into())])),
        )?;
        println!("Recorded SpO2: {spo2}% ({spo2_id})");

        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    // Let the pipeline drain
    tokio::time::sleep(Duration::from_secs(2)).await;

    let verified = sdk.verified();
    println!("\nTimestamped records: {}", verified.len());
    for record in &verified {
        println!(
            "  {} verified={}",
            record.original.id,
            sdk.verify(record)
        );
    }

    let status = sdk.status();
    println!(
        "\nPending: {} | Processed: {} | Platform: {}",
        status.pending_requests, status.processed_count, status.platform
    );

    sdk.shutdown().await;
    Ok(())
}
