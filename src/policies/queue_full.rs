//! # Queue-full admission policy
//!
//! The pool keeps a single task queue. A submission is *admitted* when the queue
//! takes the task: either a buffer slot is free (`queue_capacity > 0`) or a worker
//! is waiting to receive it (`queue_capacity == 0`, synchronous hand-off).
//! When neither holds, the policy decides what [`Pool::submit`](crate::Pool::submit) does.
//!
//! ## Variants
//! - `Wait`: **wait** until the task is admitted (default).
//! - `Discard`: **drop** the task silently and report success.
//! - `ReturnError`: **refuse** the task with [`PoolError::QueueFull`](crate::PoolError::QueueFull),
//!   which is also recorded in the pool's error collector.
//!
//! ## Invariants
//! - A task that was not admitted is never counted as outstanding, so
//!   [`Pool::wait`](crate::Pool::wait) never waits for it.
//! - Only `ReturnError` makes a refusal visible.

/// Policy controlling how submissions are handled when the queue cannot take them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueueFullPolicy {
    /// Wait for room in the queue.
    ///
    /// Use when:
    /// - Every submission must execute
    /// - Submitters can absorb the latency (natural backpressure)
    #[default]
    Wait,

    /// Drop the task and return `Ok(())`.
    ///
    /// Use when:
    /// - Work is best-effort and load shedding is preferable to latency
    /// - Example: sampling telemetry, cache warmups
    Discard,

    /// Refuse the task with `PoolError::QueueFull`.
    ///
    /// Use when:
    /// - The submitter wants to react (retry later, shed upstream)
    /// - Refusals must show up in the aggregated errors
    ReturnError,
}

impl QueueFullPolicy {
    /// Returns `true` if submissions under this policy never wait for room.
    #[inline]
    pub fn is_non_blocking(&self) -> bool {
        !matches!(self, QueueFullPolicy::Wait)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueFullPolicy::Wait => "wait",
            QueueFullPolicy::Discard => "discard",
            QueueFullPolicy::ReturnError => "return_error",
        }
    }
}
