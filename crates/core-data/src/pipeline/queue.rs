//! Bounded hand-off queue between ingestion and the bus worker.

use crate::context::CorrelationId;
use crate::error::{CoreDataError, CoreDataResult};
use crate::metrics;
use crate::ports::inbound::NotificationStatus;
use shared_types::Event;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{debug, warn};

/// A unit of work for the bus worker.
#[derive(Debug, Clone)]
pub enum DomainSignal {
    /// An event was ingested.
    EventCreated {
        correlation_id: CorrelationId,
        event: Event,
    },
}

/// Ingestion-side handle of the notification queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: mpsc::Sender<DomainSignal>,
    closed: Arc<AtomicBool>,
    enqueue_timeout: Duration,
}

impl NotificationSender {
    pub(crate) fn new(
        tx: mpsc::Sender<DomainSignal>,
        closed: Arc<AtomicBool>,
        enqueue_timeout: Duration,
    ) -> Self {
        Self {
            tx,
            closed,
            enqueue_timeout,
        }
    }

    /// Queue a signal, waiting at most the enqueue timeout for space.
    ///
    /// A full queue is reported as `NotificationStatus::Dropped`, never as an
    /// error. `PipelineClosed` once the worker has been shut down.
    pub async fn enqueue(&self, signal: DomainSignal) -> CoreDataResult<NotificationStatus> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CoreDataError::PipelineClosed);
        }

        match self.tx.send_timeout(signal, self.enqueue_timeout).await {
            Ok(()) => {
                metrics::record_signal_enqueued();
                debug!(queued = self.queued(), "Notification signal enqueued");
                Ok(NotificationStatus::Enqueued)
            }
            Err(SendTimeoutError::Timeout(DomainSignal::EventCreated { event, .. })) => {
                metrics::record_signal_dropped();
                warn!(
                    event_id = %event.id,
                    timeout_ms = self.enqueue_timeout.as_millis() as u64,
                    "Notification queue full, signal dropped"
                );
                Ok(NotificationStatus::Dropped)
            }
            Err(SendTimeoutError::Closed(_)) => Err(CoreDataError::PipelineClosed),
        }
    }

    /// Signals waiting for the worker.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether the pipeline refuses new signals.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }
}
