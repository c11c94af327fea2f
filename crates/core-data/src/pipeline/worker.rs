//! The single bus worker and its lifecycle handle.

use super::queue::{DomainSignal, NotificationSender};
use crate::config::CoreDataConfig;
use crate::metrics;
use crate::ports::outbound::{BusPublisher, TimeSource};
use shared_bus::MessageEnvelope;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Counters shared between the worker and its handle.
#[derive(Debug, Default)]
struct PipelineStats {
    published: AtomicU64,
    failed: AtomicU64,
}

/// Final counters returned by `PipelineHandle::shutdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub published: u64,
    pub failed: u64,
}

/// A bounded queue plus the worker that drains it into the bus.
///
/// ```text
/// add_event ──enqueue──→ [ bounded queue ] ──recv──→ worker ──publish──→ bus
/// ```
///
/// The worker is the only caller of the bus publisher and handles one signal
/// at a time, in enqueue order.
pub struct NotificationPipeline {
    tx: mpsc::Sender<DomainSignal>,
    rx: mpsc::Receiver<DomainSignal>,
    closed: Arc<AtomicBool>,
    enqueue_timeout: Duration,
    topic: String,
}

impl NotificationPipeline {
    /// Create a pipeline. A zero capacity is raised to one.
    pub fn new(capacity: usize, enqueue_timeout: Duration, topic: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx,
            closed: Arc::new(AtomicBool::new(false)),
            enqueue_timeout,
            topic: topic.into(),
        }
    }

    pub fn from_config(config: &CoreDataConfig) -> Self {
        Self::new(
            config.pipeline_capacity,
            config.enqueue_timeout,
            config.publish_topic.clone(),
        )
    }

    /// Ingestion-side handle. Valid before and after `start`.
    #[must_use]
    pub fn sender(&self) -> NotificationSender {
        NotificationSender::new(self.tx.clone(), self.closed.clone(), self.enqueue_timeout)
    }

    /// Spawn the worker on the current tokio runtime.
    pub fn start(
        self,
        publisher: Arc<dyn BusPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> PipelineHandle {
        let token = CancellationToken::new();
        let stats = Arc::new(PipelineStats::default());

        let worker = Worker {
            publisher,
            clock,
            topic: self.topic,
            stats: stats.clone(),
        };
        let join = tokio::spawn(worker.run(self.rx, token.clone()));

        PipelineHandle {
            token,
            closed: self.closed,
            join: Some(join),
            stats,
        }
    }
}

/// Lifecycle handle of a running worker.
///
/// Dropping the handle stops the worker after it drains the queue; call
/// `shutdown` to wait for that.
pub struct PipelineHandle {
    token: CancellationToken,
    closed: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
    stats: Arc<PipelineStats>,
}

impl PipelineHandle {
    /// Envelopes the bus accepted so far.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.stats.published.load(Ordering::Relaxed)
    }

    /// Signals that could not be published.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.stats.failed.load(Ordering::Relaxed)
    }

    /// Refuse new signals, drain the queue and wait for the worker to exit.
    pub async fn shutdown(mut self) -> PipelineReport {
        self.stop();

        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                error!(error = %err, "Notification worker terminated abnormally");
            }
        }

        PipelineReport {
            published: self.published(),
            failed: self.failed(),
        }
    }

    fn stop(&self) {
        self.closed.store(true, Ordering::Release);
        self.token.cancel();
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    publisher: Arc<dyn BusPublisher>,
    clock: Arc<dyn TimeSource>,
    topic: String,
    stats: Arc<PipelineStats>,
}

impl Worker {
    async fn run(self, mut rx: mpsc::Receiver<DomainSignal>, token: CancellationToken) {
        info!(topic = %self.topic, "Notification worker started");

        loop {
            tokio::select! {
                biased;
                signal = rx.recv() => match signal {
                    Some(signal) => self.process(signal).await,
                    None => break,
                },
                () = token.cancelled() => {
                    rx.close();
                    let mut drained = 0usize;
                    while let Some(signal) = rx.recv().await {
                        self.process(signal).await;
                        drained += 1;
                    }
                    debug!(drained, "Notification queue drained");
                    break;
                }
            }
        }

        info!(
            published = self.stats.published.load(Ordering::Relaxed),
            failed = self.stats.failed.load(Ordering::Relaxed),
            "Notification worker stopped"
        );
    }

    /// Publish one signal. Failures are logged and counted; the worker moves on.
    async fn process(&self, signal: DomainSignal) {
        let DomainSignal::EventCreated {
            correlation_id,
            event,
        } = signal;

        let envelope = match MessageEnvelope::json(
            correlation_id,
            event.checksum.clone(),
            &event,
            self.clock.now_millis(),
        ) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                metrics::record_publish_failure();
                error!(event_id = %event.id, error = %err, "Failed to encode event notification");
                return;
            }
        };

        match self.publisher.publish(&self.topic, envelope).await {
            Ok(()) => {
                self.stats.published.fetch_add(1, Ordering::Relaxed);
                metrics::record_envelope_published();
                debug!(
                    event_id = %event.id,
                    correlation_id = %correlation_id,
                    "Event notification published"
                );
            }
            Err(err) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                metrics::record_publish_failure();
                warn!(
                    event_id = %event.id,
                    topic = %self.topic,
                    error = %err,
                    "Event notification not published"
                );
            }
        }
    }
}
