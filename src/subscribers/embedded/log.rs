//! # LogWriter: tracing-backed event renderer
//!
//! A minimal subscriber that forwards every [`Event`] to `tracing`, at `debug`
//! for routine attempt flow and at `warn`/`error` for failures. The embedding
//! application decides where those records go by installing a `tracing`
//! subscriber.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! DEBUG taskpool: starting task="fetch" attempt=1 worker=0
//!  WARN taskpool: attempt failed task="fetch" attempt=1 error="connection reset"
//! DEBUG taskpool: backoff scheduled task="fetch" delay_ms=100 after_attempt=1
//!  INFO taskpool: queue closed
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let error = e.error.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::TaskStarting => {
                tracing::debug!(target: "taskpool", task, attempt = ?e.attempt, worker = ?e.worker, "starting");
            }
            EventKind::TaskStopped => {
                tracing::debug!(target: "taskpool", task, attempt = ?e.attempt, "stopped");
            }
            EventKind::TaskFailed => {
                tracing::warn!(target: "taskpool", task, attempt = ?e.attempt, error, "attempt failed");
            }
            EventKind::TaskPanicked => {
                tracing::error!(target: "taskpool", task, attempt = ?e.attempt, error, "attempt panicked");
            }
            EventKind::BackoffScheduled => {
                tracing::debug!(target: "taskpool", task, delay_ms = ?e.delay_ms, after_attempt = ?e.attempt, "backoff scheduled");
            }
            EventKind::RetriesExhausted => {
                tracing::warn!(target: "taskpool", task, attempts = ?e.attempt, error, "task failed");
            }
            EventKind::TaskDiscarded => {
                tracing::debug!(target: "taskpool", task, "discarded on full queue");
            }
            EventKind::TaskRejected => {
                tracing::warn!(target: "taskpool", task, error, "rejected on full queue");
            }
            EventKind::TaskDrained => {
                tracing::warn!(target: "taskpool", task, "dropped from queue after cancellation");
            }
            EventKind::WorkerStarted => {
                tracing::trace!(target: "taskpool", worker = ?e.worker, "worker started");
            }
            EventKind::WorkerStopped => {
                tracing::trace!(target: "taskpool", worker = ?e.worker, "worker stopped");
            }
            EventKind::QueueClosed => {
                tracing::info!(target: "taskpool", "queue closed");
            }
            EventKind::PoolStopped => {
                tracing::info!(target: "taskpool", "pool stopped");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                tracing::warn!(target: "taskpool", subscriber = task, error, kind = ?e.kind, "subscriber trouble");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
