//! edgestamp CLI client

use anyhow::Result;
use clap::{Parser, Subcommand};
use edgestamp_client::config::{API_KEY_ENV, DEFAULT_BASE_URL};
use edgestamp_client::sdk::new_record;
use edgestamp_client::{load_api_key, EdgeStampSdk, SdkConfig};
use edgestamp_types::SensorValue;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "edgestamp")]
#[command(about = "Wearable sensor timestamping client", long_about = None)]
struct Cli {
    /// Timestamp service URL
    #[arg(short, long, default_value = DEFAULT_BASE_URL)]
    server: String,

    /// API key (falls back to the EDGESTAMP_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// File containing the API key
    #[arg(long)]
    api_key_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record simulated sensor readings and wait for timestamping
    Simulate {
        /// Number of readings to record
        #[arg(short, long, default_value_t = 10)]
        count: u32,

        /// Delay between readings in milliseconds
        #[arg(long, default_value_t = 200)]
        interval_ms: u64,

        /// Sensor type label
        #[arg(long, default_value = "heart_rate")]
        sensor: String,
    },

    /// Canonicalize a JSON value from stdin and print its digest
    Digest {
        /// Sensor type label for the generated record
        #[arg(long, default_value = "stdin")]
        sensor: String,
    },
}

fn resolve_api_key(cli: &Cli) -> Result<String> {
    if let Some(key) = &cli.api_key {
        return Ok(key.clone());
    }
    Ok(load_api_key(API_KEY_ENV, cli.api_key_file.as_deref())?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Simulate {
            count,
            interval_ms,
            sensor,
        } => {
            let api_key = resolve_api_key(&cli)?;
            let config = SdkConfig::new(api_key).with_base_url(cli.server.clone());
            let sdk = EdgeStampSdk::new(config)?;

            println!("Recording {count} simulated {sensor} readings...");

            for _ in 0..*count {
                let bpm: i64 = rand::thread_rng().gen_range(60..=100);
                let metadata = BTreeMap::from([
                    ("unit".to_string(), "bpm".into()),
                    ("location".to_string(), "wrist".into()),
                ]);
                let id = sdk.record(sensor, bpm, Some(metadata))?;
                println!("Recorded {bpm} ({id})");

                tokio::time::sleep(Duration::from_millis(*interval_ms)).await;
            }

            // Give the worker a bounded window to drain the queue
            let deadline = std::time::Instant::now() + Duration::from_secs(15);
            while sdk.status().pending_requests > 0 && std::time::Instant::now() < deadline {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }

            let records = sdk.verified();
            println!();
            println!("Timestamped {} of {count} readings", records.len());
            for record in &records {
                let ok = if sdk.verify(record) { "ok" } else { "TAMPERED" };
                println!(
                    "  {} issued_at={} verify={}",
                    record.original.id, record.issued_at, ok
                );
            }

            let status = sdk.status();
            println!();
            println!("Status");
            println!("======");
            println!("Pending:   {}", status.pending_requests);
            println!("Processed: {}", status.processed_count);
            println!("Platform:  {}", status.platform);
            println!("Full:      {}", status.queue_full);

            sdk.shutdown().await;
        }

        Commands::Digest { sensor } => {
            use std::io::Read;

            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;

            let value: SensorValue = serde_json::from_str(input.trim())?;
            let record = new_record(sensor, value, BTreeMap::new());

            let bytes = edgestamp_core::canonical_bytes(&record)?;
            let digest = edgestamp_core::digest_bytes(&bytes);

            println!("Canonical: {}", String::from_utf8_lossy(&bytes));
            println!("Digest:    {digest}");
        }
    }

    Ok(())
}
