//! Per-request context: correlation id and cancellation.
//!
//! Every store and device-registry round-trip runs under the caller's
//! context. Cancelling the context aborts the in-flight call and the
//! operation fails with `CoreDataError::Cancelled`.

use crate::error::{CoreDataError, CoreDataResult};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Correlation ID for tracking a request through logs and notifications.
pub type CorrelationId = Uuid;

/// Caller-supplied context for one service operation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    token: CancellationToken,
}

impl RequestContext {
    /// Fresh context with a random correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Context bound to an existing cancellation token.
    #[must_use]
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            token,
        }
    }

    /// Child context: same correlation id, cancelled with its parent.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            correlation_id: self.correlation_id,
            token: self.token.child_token(),
        }
    }

    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Cancel this context and every child.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the context is cancelled first.
    ///
    /// The future is dropped as soon as cancellation is observed.
    pub async fn guard<F>(&self, fut: F) -> CoreDataResult<F::Output>
    where
        F: Future,
    {
        if self.token.is_cancelled() {
            return Err(CoreDataError::Cancelled);
        }

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(CoreDataError::Cancelled),
            output = fut => Ok(output),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
