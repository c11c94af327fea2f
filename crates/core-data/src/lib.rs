//! # Core Data
//!
//! Stores sensor telemetry (events and the readings they own) together with
//! the value descriptors that give readings their meaning, and tells the rest
//! of the system about every new event.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!   EventApi      │               CoreDataService                │
//!   ReadingApi ──→│  guard ─ integrity ─ retention ─ ingestion   │
//!   ValueDesc.Api │                                   │          │
//!   RetentionApi  └──────┬──────────────┬─────────────┼──────────┘
//!                        │              │             │ enqueue
//!                        ↓              ↓             ↓
//!                   DataStore    DeviceResolver  [bounded queue]
//!                                                     │
//!                                                  worker ──→ BusPublisher
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Child-first deletes | An event's readings are deleted before the event |
//! | Descriptor guard | A descriptor referenced by readings is neither deleted nor renamed |
//! | Unique names | Two descriptors never share a name |
//! | Ordered notification | Envelopes are published in ingestion order |
//! | Bounded ingestion | A full notification queue drops the signal instead of blocking |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Format-string grammar and partial-update merges
//! - `ports/` - Inbound API traits and outbound SPI traits
//! - `service/` - Application service implementing the API
//! - `pipeline/` - Notification queue and bus worker
//! - `adapters/` - In-memory store, static device registry, bus and clocks
//!
//! ## Usage
//!
//! ```ignore
//! use core_data::{CoreDataConfig, CoreDataDependencies, CoreDataService, NotificationPipeline};
//!
//! let config = CoreDataConfig::from_env();
//! let pipeline = NotificationPipeline::from_config(&config);
//! let notifier = pipeline.sender();
//! let handle = pipeline.start(publisher, clock.clone());
//!
//! let service = CoreDataService::new(
//!     CoreDataDependencies { store, resolver, notifier, clock },
//!     config,
//! );
//! let receipt = service.add_event(&RequestContext::new(), event).await?;
//!
//! handle.shutdown().await;
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod ports;
pub mod service;

#[cfg(test)]
mod test_utils;

// Re-export key types for convenience
pub use config::{ConfigError, CoreDataConfig};
pub use context::{CorrelationId, RequestContext};
pub use error::{
    CoreDataError, CoreDataResult, EntityKind, ErrorKind, ResolverError, StoreError, StoreResult,
};
pub use pipeline::{
    DomainSignal, NotificationPipeline, NotificationSender, PipelineHandle, PipelineReport,
};
pub use ports::inbound::{
    AddEventReceipt, DescriptorUsage, EventApi, NotificationStatus, ReadingApi, RetentionApi,
    ValueDescriptorApi,
};
pub use ports::outbound::{BusPublisher, DataStore, DeviceRef, DeviceResolver, TimeSource};
pub use service::{CoreDataDependencies, CoreDataService};
