//! # Core Telemetry
//!
//! Observability setup for the core data node.
//!
//! ## Components
//!
//! - **Logging**: `tracing` subscriber with an `EnvFilter`, JSON output for
//!   containers and human-readable output for development
//! - **Metrics**: Prometheus text export of the counters the service
//!   registers when built with its `metrics` feature
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CORE_DATA_SERVICE_NAME` | `core-data` | Service name in the startup log |
//! | `CORE_DATA_LOG_LEVEL` | `info` | Log filter directive (falls back to `RUST_LOG`) |
//! | `CORE_DATA_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `CORE_DATA_LOG_ANSI` | `true` | Colorized output |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::encode_metrics;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),

    #[error("Failed to export metrics: {0}")]
    MetricsExport(String),
}
