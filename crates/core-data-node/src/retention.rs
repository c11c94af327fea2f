//! Periodic retention ticker.
//!
//! Runs the configured scrub policies on a fixed interval until the node's
//! shutdown token fires. A failed tick is logged and the next tick runs as
//! usual.

use crate::config::RetentionConfig;
use core_data::{CoreDataResult, RequestContext, RetentionApi};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Events removed by one tick, per policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrubSummary {
    pub aged: usize,
    pub pushed: usize,
}

/// Apply every configured policy once.
///
/// The age policy runs first. The first failing policy aborts the tick.
pub async fn run_policies<R>(
    retention: &R,
    config: &RetentionConfig,
    ctx: &RequestContext,
) -> CoreDataResult<ScrubSummary>
where
    R: RetentionApi + ?Sized,
{
    let mut summary = ScrubSummary::default();

    if let Some(age) = config.max_event_age_ms {
        summary.aged = retention.scrub_by_age(ctx, age).await?;
    }
    if config.scrub_pushed {
        summary.pushed = retention.scrub_pushed(ctx).await?;
    }

    Ok(summary)
}

/// Spawn the ticker. Returns `None` when no interval or no policy is set.
pub fn spawn_ticker(
    retention: Arc<dyn RetentionApi>,
    config: RetentionConfig,
    shutdown: CancellationToken,
) -> Option<JoinHandle<()>> {
    let period = config.scrub_interval?;
    if !config.has_policy() {
        warn!("Scrub interval set but no retention policy configured, ticker not started");
        return None;
    }

    info!(
        period_secs = period.as_secs(),
        max_event_age_ms = ?config.max_event_age_ms,
        scrub_pushed = config.scrub_pushed,
        "Starting retention ticker"
    );

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    debug!("Retention ticker stopping");
                    break;
                }
                _ = interval.tick() => {
                    // In-flight scrubs are cancelled with the node.
                    let ctx = RequestContext::with_token(shutdown.child_token());
                    match run_policies(retention.as_ref(), &config, &ctx).await {
                        Ok(summary) => {
                            if summary != ScrubSummary::default() {
                                info!(aged = summary.aged, pushed = summary.pushed, "Retention tick");
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, correlation_id = %ctx.correlation_id(), "Retention tick failed");
                        }
                    }
                }
            }
        }
    }))
}
