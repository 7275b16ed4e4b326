//! Job-scoped execution context.
//!
//! One context is created when a job starts and dropped when it ends.
//! There is deliberately no process-wide job registry: everything a
//! component needs - the store, the cancellation token, the progress
//! sink - travels inside the context.

use crate::cancellation::CancellationToken;
use crate::core::JobId;
use crate::events::{NoOpProgressSink, ProgressSink};
use crate::store::TaskStore;
use std::sync::Arc;

/// Shared state for one job's lifetime.
pub struct JobContext {
    /// The job this context belongs to.
    pub job_id: JobId,
    /// Single-writer task state.
    pub store: Arc<TaskStore>,
    /// Cancellation signal shared by every component of the job.
    pub cancel: Arc<CancellationToken>,
    /// Sink for human-readable progress strings.
    pub progress: Arc<dyn ProgressSink>,
}

impl JobContext {
    /// Creates a fresh context for a job.
    #[must_use]
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            store: Arc::new(TaskStore::new()),
            cancel: Arc::new(CancellationToken::new()),
            progress: Arc::new(NoOpProgressSink),
        }
    }

    /// Replaces the progress sink.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Requests cancellation of the whole job.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.cancel.cancel(reason);
    }
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("job_id", &self.job_id)
            .field("task_count", &self.store.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_starts_clean() {
        let ctx = JobContext::new(JobId::new());
        assert!(ctx.store.is_empty());
        assert!(!ctx.cancel.is_cancelled());
    }

    #[test]
    fn test_cancel_shortcut() {
        let ctx = JobContext::new(JobId::new());
        ctx.cancel("user aborted");
        assert!(ctx.cancel.is_cancelled());
        assert_eq!(ctx.cancel.reason(), Some("user aborted".to_string()));
    }
}
