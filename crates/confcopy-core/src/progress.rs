//! Progress and cooperative cancellation
//!
//! Callers hand a [`ProgressMonitor`] to every potentially slow operation.
//! Delegates observe [`ProgressMonitor::is_cancelled`] and fail with
//! [`DelegateError::Cancelled`] instead of completing silently.

use crate::error::DelegateError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Progress reporting and cancellation channel
pub trait ProgressMonitor: Send + Sync {
    /// Announce a named unit of work
    fn begin_subtask(&self, label: &str);

    /// Whether the caller asked to stop
    fn is_cancelled(&self) -> bool;
}

/// Monitor that reports nothing and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressMonitor for NullProgress {
    fn begin_subtask(&self, _label: &str) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Monitor that records subtasks and can be cancelled from another thread
#[derive(Debug, Default)]
pub struct ProgressTracker {
    cancelled: AtomicBool,
    subtasks: Mutex<Vec<String>>,
}

impl ProgressTracker {
    /// Create a tracker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Subtask labels seen so far
    #[must_use]
    pub fn subtasks(&self) -> Vec<String> {
        self.subtasks.lock().clone()
    }
}

impl ProgressMonitor for ProgressTracker {
    fn begin_subtask(&self, label: &str) {
        tracing::debug!("{}", label);
        self.subtasks.lock().push(label.to_string());
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Fail with `Cancelled` if the monitor was cancelled
///
/// # Errors
/// Returns [`DelegateError::Cancelled`] after cancellation
#[inline]
pub fn ensure_not_cancelled(progress: &dyn ProgressMonitor) -> Result<(), DelegateError> {
    if progress.is_cancelled() {
        Err(DelegateError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_progress_never_cancels() {
        assert!(ensure_not_cancelled(&NullProgress).is_ok());
    }

    #[test]
    fn tracker_records_and_cancels() {
        let tracker = ProgressTracker::new();
        tracker.begin_subtask("Saving a");
        assert!(ensure_not_cancelled(&tracker).is_ok());

        tracker.cancel();
        assert!(matches!(
            ensure_not_cancelled(&tracker),
            Err(DelegateError::Cancelled)
        ));
        assert_eq!(tracker.subtasks(), vec!["Saving a"]);
    }
}
