//! Bounded timestamping pipeline: queue plus background worker
//!
//! Submissions never block: a full queue is an immediate, visible error to
//! the caller. The worker dequeues one item at a time, calls the timestamp
//! service, and either stores the result or re-enqueues the item for a
//! bounded number of retries. A retry that finds the queue full is dropped
//! without notifying the original caller — submission-time overflow is
//! visible, retry-time overflow is not. That asymmetry is deliberate and
//! must not be collapsed into a single path.

use crate::config::SdkConfig;
use crate::remote::TimestampService;
use crate::{Result, SdkError};
use edgestamp_types::{CanonicalRecord, Digest, VerifiedRecord};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Why an item left the pipeline without being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// All attempts failed
    RetriesExhausted,
    /// A retry found the queue full
    RetryQueueFull,
}

/// Hook for hosts that want visibility into worker-side outcomes without
/// the SDK holding any global state. All methods default to no-ops.
pub trait PipelineObserver: Send + Sync {
    fn on_stored(&self, _id: &str) {}
    fn on_dropped(&self, _id: &str, _reason: DropReason) {}
}

/// Default observer: logging via `tracing` is the only signal.
pub(crate) struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// A reading in flight through the pipeline.
pub(crate) struct QueueItem {
    pub id: String,
    pub digest: Digest,
    pub record: CanonicalRecord,
    pub retry_count: u32,
}

enum QueueMessage {
    Item(QueueItem),
    /// Unblocks a waiting worker during shutdown
    Shutdown,
}

pub(crate) struct Pipeline {
    tx: mpsc::Sender<QueueMessage>,
    stored: Arc<Mutex<Vec<VerifiedRecord>>>,
    stop: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown_wait: Duration,
}

impl Pipeline {
    /// Create the queue and spawn the single background worker.
    pub fn spawn(
        config: &SdkConfig,
        service: Arc<dyn TimestampService>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let stored = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let worker = tokio::spawn(run_worker(WorkerContext {
            rx,
            retry_tx: tx.clone(),
            stored: stored.clone(),
            stop: stop.clone(),
            service,
            observer,
            max_retries: config.max_retries,
            poll_interval: config.poll_interval,
        }));

        Self {
            tx,
            stored,
            stop,
            worker: Mutex::new(Some(worker)),
            shutdown_wait: config.shutdown_wait,
        }
    }

    /// Non-blocking enqueue. Fails fast with `QueueOverflow` when the queue
    /// is at capacity, or once the worker is gone after shutdown.
    pub fn submit(&self, item: QueueItem) -> Result<()> {
        self.tx
            .try_send(QueueMessage::Item(item))
            .map_err(|_| SdkError::QueueOverflow)
    }

    /// Snapshot of all stored records.
    pub fn verified(&self) -> Vec<VerifiedRecord> {
        self.stored.lock().clone()
    }

    pub fn processed(&self) -> usize {
        self.stored.lock().len()
    }

    /// Current queue depth.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.tx.capacity() == 0
    }

    /// Signal the worker to stop and wait for it, bounded by the configured
    /// shutdown budget. A worker stuck in a slow remote call is abandoned
    /// once the budget elapses; its items are lost with the process.
    pub async fn shutdown(&self) {
        self.stop.store(true, Ordering::Relaxed);
        // Unblock a worker waiting on an empty queue; a full queue is fine,
        // the poll interval bounds the wait either way.
        let _ = self.tx.try_send(QueueMessage::Shutdown);

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(self.shutdown_wait, handle).await {
                Ok(Ok(())) => debug!("worker stopped"),
                Ok(Err(err)) => error!(%err, "worker task failed"),
                Err(_) => warn!(
                    "worker did not stop within {:?}, proceeding with shutdown",
                    self.shutdown_wait
                ),
            }
        }
    }
}

struct WorkerContext {
    rx: mpsc::Receiver<QueueMessage>,
    retry_tx: mpsc::Sender<QueueMessage>,
    stored: Arc<Mutex<Vec<VerifiedRecord>>>,
    stop: Arc<AtomicBool>,
    service: Arc<dyn TimestampService>,
    observer: Arc<dyn PipelineObserver>,
    max_retries: u32,
    poll_interval: Duration,
}

/// The single consumer. Every failure becomes a retry or a drop decision;
/// nothing escapes this loop.
async fn run_worker(mut ctx: WorkerContext) {
    debug!("timestamp worker started");

    while !ctx.stop.load(Ordering::Relaxed) {
        let mut item = match tokio::time::timeout(ctx.poll_interval, ctx.rx.recv()).await {
            // Poll tick: re-check the stop signal
            Err(_) => continue,
            Ok(None) | Ok(Some(QueueMessage::Shutdown)) => break,
            Ok(Some(QueueMessage::Item(item))) => item,
        };

        match ctx.service.submit(&item.digest).await {
            Ok(token) => {
                let record = VerifiedRecord {
                    original: item.record,
                    digest: item.digest,
                    issued_at: token.issued_at,
                    proof: token.proof,
                };
                ctx.stored.lock().push(record);
                info!(id = %item.id, "timestamped");
                ctx.observer.on_stored(&item.id);
            }
            Err(err) => {
                error!(id = %item.id, %err, "timestamp request failed");
                if item.retry_count < ctx.max_retries {
                    item.retry_count += 1;
                    let id = item.id.clone();
                    if ctx.retry_tx.try_send(QueueMessage::Item(item)).is_err() {
                        // Invisible to the original caller: accepted loss
                        // under sustained overload.
                        warn!(id = %id, "queue full, dropping retry");
                        ctx.observer.on_dropped(&id, DropReason::RetryQueueFull);
                    }
                } else {
                    warn!(id = %item.id, "retries exhausted, dropping");
                    ctx.observer.on_dropped(&item.id, DropReason::RetriesExhausted);
                }
            }
        }
    }

    debug!("timestamp worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use async_trait::async_trait;
    use edgestamp_types::{SensorValue, TimestampToken};
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicU32;
    use std::time::Instant;
    use tokio::sync::Semaphore;

    fn test_config(capacity: usize) -> SdkConfig {
        SdkConfig::new("test-key")
            .with_queue_capacity(capacity)
            .with_poll_interval(Duration::from_millis(20))
            .with_shutdown_wait(Duration::from_millis(500))
    }

    fn item(id: &str) -> QueueItem {
        let record = CanonicalRecord {
            id: id.to_string(),
            metadata: BTreeMap::new(),
            sensor_type: "test".to_string(),
            timestamp_request: "2026-08-08T12:00:00.000000Z".to_string(),
            value: SensorValue::from(1),
        };
        let bytes = edgestamp_core::canonical_bytes(&record).unwrap();
        QueueItem {
            id: id.to_string(),
            digest: edgestamp_core::digest_bytes(&bytes),
            record,
            retry_count: 0,
        }
    }

    async fn wait_for(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cond()
    }

    /// Always succeeds.
    struct OkService;

    #[async_trait]
    impl TimestampService for OkService {
        async fn submit(&self, _: &Digest) -> std::result::Result<TimestampToken, RemoteError> {
            Ok(TimestampToken {
                issued_at: "2026-08-08T12:00:01Z".to_string(),
                proof: Some("proof".to_string()),
            })
        }
    }

    /// Always fails, counting attempts.
    struct FailingService {
        calls: AtomicU32,
    }

    #[async_trait]
    impl TimestampService for FailingService {
        async fn submit(&self, _: &Digest) -> std::result::Result<TimestampToken, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RemoteError::Status(503))
        }
    }

    /// Blocks every call until a permit is released, then fails.
    struct GatedFailingService {
        gate: Semaphore,
        calls: AtomicU32,
    }

    #[async_trait]
    impl TimestampService for GatedFailingService {
        async fn submit(&self, _: &Digest) -> std::result::Result<TimestampToken, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let permit = self.gate.acquire().await.expect("gate closed");
            permit.forget();
            Err(RemoteError::Network("connection reset".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<(String, DropReason)>>,
    }

    impl PipelineObserver for RecordingObserver {
        fn on_dropped(&self, id: &str, reason: DropReason) {
            self.events.lock().push((id.to_string(), reason));
        }
    }

    #[tokio::test]
    async fn test_success_is_stored() {
        let pipeline = Pipeline::spawn(&test_config(10), Arc::new(OkService), Arc::new(NoopObserver));

        pipeline.submit(item("a")).unwrap();
        assert!(wait_for(|| pipeline.processed() == 1, Duration::from_secs(2)).await);

        let records = pipeline.verified();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].original.id, "a");
        assert!(records[0].has_proof());

        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_retry_bound_is_three_attempts() {
        let service = Arc::new(FailingService {
            calls: AtomicU32::new(0),
        });
        let observer = Arc::new(RecordingObserver::default());
        let pipeline = Pipeline::spawn(&test_config(10), service.clone(), observer.clone());

        pipeline.submit(item("doomed")).unwrap();

        // 1 initial attempt + 2 retries, then dropped
        assert!(
            wait_for(
                || !observer.events.lock().is_empty(),
                Duration::from_secs(2)
            )
            .await
        );
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *observer.events.lock(),
            vec![("doomed".to_string(), DropReason::RetriesExhausted)]
        );
        assert!(pipeline.verified().is_empty());

        // No further attempts after the drop
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);

        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_overflow_fails_fast_at_capacity() {
        let service = Arc::new(GatedFailingService {
            gate: Semaphore::new(0),
            calls: AtomicU32::new(0),
        });
        let pipeline = Pipeline::spawn(&test_config(3), service.clone(), Arc::new(NoopObserver));

        // First item is picked up by the worker and parks in the service
        pipeline.submit(item("in-flight")).unwrap();
        assert!(wait_for(|| pipeline.pending() == 0, Duration::from_secs(2)).await);

        // Fill the queue to capacity
        for i in 0..3 {
            pipeline.submit(item(&format!("queued-{i}"))).unwrap();
        }
        assert_eq!(pipeline.pending(), 3);
        assert!(pipeline.is_full());

        // Capacity + 1 fails synchronously
        let overflow = pipeline.submit(item("rejected"));
        assert!(matches!(overflow, Err(SdkError::QueueOverflow)));
        assert_eq!(pipeline.pending(), 3);

        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_retry_requeue_drop_is_invisible_to_caller() {
        let service = Arc::new(GatedFailingService {
            gate: Semaphore::new(0),
            calls: AtomicU32::new(0),
        });
        let observer = Arc::new(RecordingObserver::default());
        let pipeline = Pipeline::spawn(&test_config(1), service.clone(), observer.clone());

        // Worker takes the first item and parks inside the service call
        assert!(pipeline.submit(item("first")).is_ok());
        assert!(wait_for(|| pipeline.pending() == 0, Duration::from_secs(2)).await);

        // A newer submission now occupies the single queue slot
        assert!(pipeline.submit(item("second")).is_ok());
        assert_eq!(pipeline.pending(), 1);

        // Release the first call: it fails, and its retry finds the queue
        // full, so "first" is dropped without any error to the caller
        service.gate.add_permits(1);
        assert!(
            wait_for(
                || observer
                    .events
                    .lock()
                    .contains(&("first".to_string(), DropReason::RetryQueueFull)),
                Duration::from_secs(2)
            )
            .await
        );

        // "second" churns through its own attempts and is eventually dropped
        service.gate.add_permits(10);
        assert!(
            wait_for(
                || observer
                    .events
                    .lock()
                    .contains(&("second".to_string(), DropReason::RetriesExhausted)),
                Duration::from_secs(2)
            )
            .await
        );

        assert!(pipeline.verified().is_empty());
        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_within_budget_with_stuck_worker() {
        let service = Arc::new(GatedFailingService {
            gate: Semaphore::new(0),
            calls: AtomicU32::new(0),
        });
        let pipeline = Pipeline::spawn(&test_config(5), service.clone(), Arc::new(NoopObserver));

        pipeline.submit(item("stuck")).unwrap();
        assert!(wait_for(|| service.calls.load(Ordering::SeqCst) == 1, Duration::from_secs(2)).await);

        // Worker is parked in the service call and cannot observe the stop
        // signal; shutdown must still return within its budget.
        let start = Instant::now();
        pipeline.shutdown().await;
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let pipeline = Pipeline::spawn(&test_config(5), Arc::new(OkService), Arc::new(NoopObserver));
        pipeline.shutdown().await;

        let result = pipeline.submit(item("late"));
        assert!(matches!(result, Err(SdkError::QueueOverflow)));
    }

    #[tokio::test]
    async fn test_fifo_order_for_first_attempts() {
        let pipeline = Pipeline::spawn(&test_config(10), Arc::new(OkService), Arc::new(NoopObserver));

        for i in 0..5 {
            pipeline.submit(item(&format!("r{i}"))).unwrap();
        }
        assert!(wait_for(|| pipeline.processed() == 5, Duration::from_secs(2)).await);

        let ids: Vec<String> = pipeline
            .verified()
            .into_iter()
            .map(|r| r.original.id)
            .collect();
        assert_eq!(ids, vec!["r0", "r1", "r2", "r3", "r4"]);

        pipeline.shutdown().await;
    }
}
