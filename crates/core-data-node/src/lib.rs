//! # Core Data Node
//!
//! The runnable core data service.
//!
//! ## Modular Structure
//!
//! - `config` - `NodeConfig` loaded from the environment
//! - `retention` - Periodic scrub ticker
//! - `runtime` - Adapter wiring, startup and graceful shutdown

pub mod config;
pub mod retention;
pub mod runtime;

pub use config::{NodeConfig, NodeConfigError, RetentionConfig};
pub use retention::{run_policies, spawn_ticker, ScrubSummary};
pub use runtime::CoreDataNode;
