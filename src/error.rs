//! Error types used by the pool and by tasks.
//!
//! This module defines two main error enums:
//!
//! - [`PoolError`]: errors raised by the pool itself (admission, shutdown, construction)
//!   and the entries stored by the pool's error collector.
//! - [`TaskError`]: errors raised by individual task executions.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics
//! and additional utilities such as [`TaskError::is_retryable`].
//! Both are `Clone` so that error snapshots handed out by the pool are plain copies.

use thiserror::Error;

/// # Errors produced by the pool.
///
/// Returned from [`Pool::submit`](crate::Pool::submit) and friends, and
/// collected in the pool's error aggregate (see [`Pool::errors`](crate::Pool::errors)).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// A task finished with an error after its retry budget was spent
    /// (or after a non-retryable error / panic ended the retry loop early).
    #[error("task {task:?} failed after {attempts} attempt(s): {source}")]
    Task {
        /// Name of the failed task.
        task: String,
        /// Number of attempts actually executed.
        attempts: u32,
        /// Error of the last attempt.
        #[source]
        source: TaskError,
    },

    /// The queue was at capacity and the pool uses
    /// [`QueueFullPolicy::ReturnError`](crate::QueueFullPolicy::ReturnError).
    #[error("task queue is full")]
    QueueFull {
        /// Name of the rejected task.
        task: String,
    },

    /// The queue has already been closed by [`Pool::wait`](crate::Pool::wait)
    /// or by cancellation of the run token.
    #[error("task queue is closed")]
    Closed,

    /// A pool needs at least one worker.
    #[error("worker count must be positive")]
    InvalidWorkers,
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::PoolError;
    ///
    /// let err = PoolError::QueueFull { task: "ingest".into() };
    /// assert_eq!(err.as_label(), "pool_queue_full");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::Task { .. } => "pool_task_failed",
            PoolError::QueueFull { .. } => "pool_queue_full",
            PoolError::Closed => "pool_closed",
            PoolError::InvalidWorkers => "pool_invalid_workers",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PoolError::Task {
                task,
                attempts,
                source,
            } => format!("task={task} attempts={attempts} {}", source.as_message()),
            PoolError::QueueFull { task } => format!("queue full; rejected task={task}"),
            PoolError::Closed => "queue closed".to_string(),
            PoolError::InvalidWorkers => "worker count must be positive".to_string(),
        }
    }

    /// Returns the underlying task error, if this entry came from a task execution.
    pub fn task_error(&self) -> Option<&TaskError> {
        match self {
            PoolError::Task { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns `true` if this entry records a task that panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self.task_error(), Some(TaskError::Panicked { .. }))
    }
}

/// # Errors produced by task execution.
///
/// These represent failures of individual async tasks run by the pool.
/// Some errors are retryable (`Fail`), others end the retry loop immediately.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Non-recoverable fatal error (should not be retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Task execution failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The task panicked; the panic was caught and the worker kept running.
    #[error("task panic: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// Task was cancelled (or a result read gave up) due to context cancellation.
    #[error("context cancelled")]
    Canceled,

    /// The pool refused the task at submission time.
    #[error("submission rejected: {reason}")]
    Rejected {
        /// Why the pool refused the task.
        reason: String,
    },

    /// The task was dropped without ever producing a result
    /// (discarded on a full queue, or the pool went away).
    #[error("task dropped before completion")]
    Abandoned,
}

impl TaskError {
    /// Shorthand for a retryable [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for a non-retryable [`TaskError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::TaskError;
    ///
    /// let err = TaskError::Panicked { message: "boom".into() };
    /// assert_eq!(err.as_label(), "task_panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
            TaskError::Rejected { .. } => "task_rejected",
            TaskError::Abandoned => "task_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { message } => format!("panic: {message}"),
            TaskError::Canceled => "context cancelled".to_string(),
            TaskError::Rejected { reason } => format!("rejected: {reason}"),
            TaskError::Abandoned => "abandoned".to_string(),
        }
    }

    /// Indicates whether the error type is safe to retry.
    ///
    /// Returns `true` only for [`TaskError::Fail`].
    ///
    /// # Example
    /// ```
    /// use taskpool::TaskError;
    ///
    /// assert!(TaskError::fail("flaky").is_retryable());
    /// assert!(!TaskError::fatal("nope").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. })
    }
}

impl From<PoolError> for TaskError {
    /// Maps a submission failure onto the error a result future reports.
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Task { source, .. } => source,
            other => TaskError::Rejected {
                reason: other.to_string(),
            },
        }
    }
}
