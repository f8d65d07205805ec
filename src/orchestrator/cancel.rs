//! Per-search cancellation handle

use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Reason recorded when a search outlives its time budget
pub const TIMEOUT_REASON: &str = "timeout";

/// Cooperative cancellation signal with a recorded reason
///
/// Clones share state, so a caller can keep one clone and hand another to the
/// orchestrator. The first reason passed to `cancel` wins.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    token: tokio_util::sync::CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation; observed before the next commit is started
    pub fn cancel(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::debug!("Search cancellation requested: {}", reason);
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel with [`TIMEOUT_REASON`] once `deadline` has passed; returns
    /// whether the token is cancelled
    pub fn check_deadline(&self, deadline: Option<Instant>) -> bool {
        if let Some(deadline) = deadline
            && Instant::now() >= deadline
            && !self.is_cancelled()
        {
            self.cancel(TIMEOUT_REASON);
        }
        self.is_cancelled()
    }

    /// Reason given to the first `cancel` call, if any
    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(String::as_str)
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
