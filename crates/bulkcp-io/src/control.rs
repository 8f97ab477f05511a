//! Cooperative pause and cancellation controls for copy loops

use bulkcp_types::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Control surface observed by copy loops at chunk and entry boundaries.
///
/// Cancellation wins over pause: a paused copy still honors a concurrent
/// cancel request without waiting for resume.
#[derive(Debug, Clone)]
pub struct CopyControls {
    cancel: CancellationToken,
    paused: Arc<AtomicBool>,
    pause_poll: Duration,
}

impl CopyControls {
    /// Default interval at which a paused copy re-checks its flags
    pub const DEFAULT_PAUSE_POLL: Duration = Duration::from_millis(100);

    /// Create controls bound to a task's cancellation token and pause flag
    pub fn new(cancel: CancellationToken, paused: Arc<AtomicBool>, pause_poll: Duration) -> Self {
        Self {
            cancel,
            paused,
            pause_poll,
        }
    }

    /// Create controls that never pause and are never cancelled.
    ///
    /// Useful for direct copy calls outside of task management.
    pub fn unrestricted() -> Self {
        Self {
            cancel: CancellationToken::new(),
            paused: Arc::new(AtomicBool::new(false)),
            pause_poll: Self::DEFAULT_PAUSE_POLL,
        }
    }

    /// Get the underlying cancellation token
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Check whether the pause flag is currently set
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Suspension point honored between chunks and between tree entries.
    ///
    /// Returns `Error::Cancelled` as soon as cancellation is requested.
    /// While the pause flag is set, polls at the configured interval
    /// without consuming the cancellation check.
    pub async fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        while self.paused.load(Ordering::Acquire) {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(self.pause_poll) => {}
            }
        }

        Ok(())
    }
}
