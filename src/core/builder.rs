use std::sync::Arc;
use std::time::Duration;

use crate::{
    core::Config,
    error::PoolError,
    policies::{BackoffPolicy, QueueFullPolicy},
    subscribers::Subscribe,
};

use super::pool::Pool;

/// Builder for constructing a [`Pool`] with optional features.
pub struct PoolBuilder {
    workers: usize,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl PoolBuilder {
    /// Creates a builder for a pool of `workers` workers with the default config.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            cfg: Config::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the number of retries after a failed attempt.
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.cfg = self.cfg.with_retry(retry);
        self
    }

    /// Sets a constant pause between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.cfg = self.cfg.with_retry_delay(delay);
        self
    }

    /// Sets the backoff policy between attempts.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.cfg = self.cfg.with_backoff(backoff);
        self
    }

    /// Sets the queue buffer size (`0` = synchronous hand-off).
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.cfg = self.cfg.with_queue_capacity(capacity);
        self
    }

    /// Sets the queue-full policy.
    pub fn with_queue_full(mut self, policy: QueueFullPolicy) -> Self {
        self.cfg = self.cfg.with_queue_full(policy);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive pool events (task attempts, failures, lifecycle)
    /// through dedicated workers with bounded queues, started by [`Pool::run`].
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the pool.
    ///
    /// Returns [`PoolError::InvalidWorkers`] if the worker count is zero.
    pub fn build(self) -> Result<Pool, PoolError> {
        if self.workers == 0 {
            return Err(PoolError::InvalidWorkers);
        }
        Ok(Pool::new_internal(self.workers, self.cfg, self.subscribers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_config() {
        let pool = PoolBuilder::new(3)
            .with_retry(2)
            .with_queue_capacity(4)
            .with_queue_full(QueueFullPolicy::Discard)
            .build()
            .unwrap();

        assert_eq!(pool.workers(), 3);
        assert_eq!(pool.config().max_attempts(), 3);
        assert_eq!(pool.config().queue_full, QueueFullPolicy::Discard);
    }

    #[test]
    fn zero_workers_fail_to_build() {
        assert!(matches!(
            PoolBuilder::new(0).build(),
            Err(PoolError::InvalidWorkers)
        ));
    }
}
