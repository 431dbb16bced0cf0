//! # Pool configuration.
//!
//! Provides [`Config`], the tunables a [`Pool`](crate::Pool) is built with.
//! The config is moved into the pool at construction and only read afterwards.
//!
//! ## Sentinel values
//! - `retry = 0` → every task runs exactly once
//! - `queue_capacity = 0` → synchronous hand-off (a submit is accepted only when a worker takes it)
//! - `backoff` zero → no pause between attempts
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{Config, QueueFullPolicy};
//!
//! let cfg = Config::default()
//!     .with_retry(3)
//!     .with_retry_delay(Duration::from_millis(50))
//!     .with_queue_capacity(64)
//!     .with_queue_full(QueueFullPolicy::ReturnError);
//!
//! assert_eq!(cfg.max_attempts(), 4);
//! assert!(!cfg.hand_off());
//! ```

use std::time::Duration;

use crate::policies::{BackoffPolicy, QueueFullPolicy};

/// Configuration for a task pool.
///
/// ## Field semantics
/// - `retry`: additional attempts after a failed one (`total = retry + 1`)
/// - `backoff`: pause between attempts of the same task
/// - `queue_capacity`: task buffer size (`0` = synchronous hand-off)
/// - `queue_full`: what `submit` does when the queue cannot take a task
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Additional attempts after the first failure.
    ///
    /// Only retryable errors ([`TaskError::Fail`](crate::TaskError::Fail)) are retried.
    pub retry: u32,

    /// Delay policy between attempts of the same task.
    ///
    /// Never applied after the last attempt.
    pub backoff: BackoffPolicy,

    /// Number of tasks the queue buffers while all workers are busy.
    ///
    /// - `0` = no buffer: a submission is handed directly to an idle worker
    /// - `n > 0` = at most `n` tasks wait in the queue
    pub queue_capacity: usize,

    /// Behavior of `submit` when the queue cannot take the task right now.
    pub queue_full: QueueFullPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events skip
    /// the oldest ones.
    pub bus_capacity: usize,
}

impl Config {
    /// Sets the number of retries after a failed attempt.
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    /// Sets a constant pause between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.backoff = BackoffPolicy::constant(delay);
        self
    }

    /// Sets a full backoff policy between attempts.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the queue buffer size (`0` = synchronous hand-off).
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the queue-full policy.
    pub fn with_queue_full(mut self, policy: QueueFullPolicy) -> Self {
        self.queue_full = policy;
        self
    }

    /// Sets the event bus capacity.
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Total attempts a retryable failure gets (`retry + 1`).
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.retry.saturating_add(1)
    }

    /// Returns `true` if the queue has no buffer (synchronous hand-off).
    #[inline]
    pub fn hand_off(&self) -> bool {
        self.queue_capacity == 0
    }

    /// Returns the delay before retry `retry` (0-indexed), or `None` for no pause.
    #[inline]
    pub fn retry_delay(&self, retry: u32) -> Option<Duration> {
        let delay = self.backoff.next(retry);
        (!delay.is_zero()).then_some(delay)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `retry = 0` (single attempt)
    /// - `backoff = BackoffPolicy::default()` (no pause)
    /// - `queue_capacity = 0` (synchronous hand-off)
    /// - `queue_full = QueueFullPolicy::Wait` (never drop, never refuse)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            retry: 0,
            backoff: BackoffPolicy::default(),
            queue_capacity: 0,
            queue_full: QueueFullPolicy::Wait,
            bus_capacity: 1024,
        }
    }
}
