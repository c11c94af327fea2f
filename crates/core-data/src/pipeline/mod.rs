//! # Notification Pipeline
//!
//! Decouples ingestion from the message bus. `add_event` hands each stored
//! event to a bounded queue and returns; one worker drains the queue and
//! publishes an "event created" envelope per signal.
//!
//! ## Guarantees
//!
//! - Envelopes leave in enqueue order (single consumer).
//! - A full queue never blocks ingestion past the enqueue timeout; the
//!   signal is dropped and the caller is told so.
//! - Shutdown refuses new signals, then publishes everything already queued.
//! - A failed publish is logged and counted. It never reaches the caller and
//!   never stops the worker.

mod queue;
mod worker;

pub use queue::{DomainSignal, NotificationSender};
pub use worker::{NotificationPipeline, PipelineHandle, PipelineReport};
