//! Core data node entry point.

use anyhow::{Context, Result};
use core_data_node::{CoreDataNode, NodeConfig};
use core_telemetry::{encode_metrics, init_logging};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Invalid configuration")?;
    init_logging(&config.telemetry).context("Failed to initialize logging")?;

    info!("===========================================");
    info!("  Core Data Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let node = CoreDataNode::start(config);

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    node.shutdown().await;

    match encode_metrics() {
        Ok(snapshot) => debug!(metrics = %snapshot, "Final metrics snapshot"),
        Err(err) => warn!(error = %err, "Could not encode metrics"),
    }

    Ok(())
}
