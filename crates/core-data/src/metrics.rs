//! # Core Data Metrics
//!
//! Prometheus counters for ingestion, notification and retention.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! core-data = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `core_data_events_ingested_total` - Events accepted by `add_event`
//! - `core_data_events_persisted_total` - Events written to the store
//! - `core_data_signals_enqueued_total` - Signals handed to the notification worker
//! - `core_data_signals_dropped_total` - Signals lost to a full queue
//! - `core_data_envelopes_published_total` - Envelopes accepted by the bus
//! - `core_data_publish_failures_total` - Envelopes the bus rejected
//! - `core_data_events_scrubbed_total` - Events removed by retention (by policy)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Events accepted by `add_event`
    pub static ref EVENTS_INGESTED: IntCounter = register_int_counter!(
        "core_data_events_ingested_total",
        "Total number of events ingested"
    )
    .expect("Failed to create EVENTS_INGESTED metric");

    /// Events written to the store
    pub static ref EVENTS_PERSISTED: IntCounter = register_int_counter!(
        "core_data_events_persisted_total",
        "Total number of events persisted"
    )
    .expect("Failed to create EVENTS_PERSISTED metric");

    /// Signals handed to the notification worker
    pub static ref SIGNALS_ENQUEUED: IntCounter = register_int_counter!(
        "core_data_signals_enqueued_total",
        "Total number of notification signals enqueued"
    )
    .expect("Failed to create SIGNALS_ENQUEUED metric");

    /// Signals lost to a full queue
    pub static ref SIGNALS_DROPPED: IntCounter = register_int_counter!(
        "core_data_signals_dropped_total",
        "Total number of notification signals dropped on backpressure"
    )
    .expect("Failed to create SIGNALS_DROPPED metric");

    /// Envelopes accepted by the bus
    pub static ref ENVELOPES_PUBLISHED: IntCounter = register_int_counter!(
        "core_data_envelopes_published_total",
        "Total number of envelopes published to the bus"
    )
    .expect("Failed to create ENVELOPES_PUBLISHED metric");

    /// Envelopes the bus rejected
    pub static ref PUBLISH_FAILURES: IntCounter = register_int_counter!(
        "core_data_publish_failures_total",
        "Total number of failed bus publishes"
    )
    .expect("Failed to create PUBLISH_FAILURES metric");

    /// Events removed by retention, labeled by policy
    pub static ref EVENTS_SCRUBBED: IntCounterVec = register_int_counter_vec!(
        "core_data_events_scrubbed_total",
        "Total number of events removed by retention sweeps",
        &["policy"]
    )
    .expect("Failed to create EVENTS_SCRUBBED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_event_ingested() {
    EVENTS_INGESTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_event_persisted() {
    EVENTS_PERSISTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_signal_enqueued() {
    SIGNALS_ENQUEUED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_signal_dropped() {
    SIGNALS_DROPPED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_envelope_published() {
    ENVELOPES_PUBLISHED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_publish_failure() {
    PUBLISH_FAILURES.inc();
}

/// Record events removed by a retention policy (`age`, `pushed`, `all`)
#[cfg(feature = "metrics")]
pub fn record_events_scrubbed(policy: &str, count: usize) {
    EVENTS_SCRUBBED
        .with_label_values(&[policy])
        .inc_by(count as u64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature is disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_event_ingested() {}

#[cfg(not(feature = "metrics"))]
pub fn record_event_persisted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_signal_enqueued() {}

#[cfg(not(feature = "metrics"))]
pub fn record_signal_dropped() {}

#[cfg(not(feature = "metrics"))]
pub fn record_envelope_published() {}

#[cfg(not(feature = "metrics"))]
pub fn record_publish_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_events_scrubbed(_policy: &str, _count: usize) {}
