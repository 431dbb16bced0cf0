//! # Worker: pulls tasks from the queue and runs them with retries.
//!
//! Each worker loops over the shared [`TaskQueue`](super::queue::TaskQueue) until
//! the run token is cancelled or the queue is closed and empty.
//!
//! ## Event flow
//! For each attempt of a dequeued task:
//! ```text
//! TaskStarting → [task execution] → TaskStopped  (success, done)
//!                                 → TaskFailed   (error)
//!                                 → TaskPanicked (panic, never retried)
//!
//! If a retry is scheduled:
//!   → BackoffScheduled → [sleep] → next attempt
//!
//! If the last error stands:
//!   → RetriesExhausted (error recorded in the collector)
//! ```
//!
//! ## Rules
//! - Attempts of one task run **sequentially** on the same worker.
//! - At most `retry + 1` attempts; only [`TaskError::is_retryable`] errors are retried.
//! - No pause after the final attempt; the pause is cancellable by the run token.
//! - The task is dropped before its ticket, so the outstanding count drops last.

use std::sync::Arc;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{PoolError, TaskError},
    events::{Event, EventKind},
    tasks::Task,
};

use super::{
    pool::{Job, Shared},
    runner::run_once,
};

/// One member of the pool's worker group.
pub(crate) struct Worker {
    id: usize,
    shared: Arc<Shared>,
}

impl Worker {
    pub(crate) fn new(id: usize, shared: Arc<Shared>) -> Self {
        Self { id, shared }
    }

    /// Runs the worker until the run token is cancelled or the queue is
    /// closed and drained.
    pub(crate) async fn run(self, ctx: CancellationToken) {
        let bus = &self.shared.bus;
        bus.publish(Event::new(EventKind::WorkerStarted).with_worker(self.id));
        tracing::trace!(worker = self.id, "worker started");

        loop {
            let job = tokio::select! {
                biased;
                _ = ctx.cancelled() => break,
                job = self.shared.queue.pop() => job,
            };
            let Some(Job { task, ticket }) = job else {
                break;
            };

            let outcome = self.execute(task.as_ref(), &ctx).await;
            self.shared.errors.record(outcome);
            drop(task);
            drop(ticket);
        }

        bus.publish(Event::new(EventKind::WorkerStopped).with_worker(self.id));
        tracing::trace!(worker = self.id, cancelled = ctx.is_cancelled(), "worker stopped");
        self.shared.worker_exited();
    }

    /// Runs every attempt of one task; returns its final error, if any.
    async fn execute(&self, task: &dyn Task, ctx: &CancellationToken) -> Result<(), PoolError> {
        let cfg = &self.shared.cfg;
        let bus = &self.shared.bus;
        let max_attempts = cfg.max_attempts();
        let mut attempt: u32 = 0;

        let err = loop {
            attempt += 1;
            bus.publish(
                Event::new(EventKind::TaskStarting)
                    .with_task(task.name())
                    .with_attempt(attempt)
                    .with_worker(self.id),
            );

            let err = match run_once(task, ctx, attempt, self.id, bus).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            if attempt >= max_attempts || !err.is_retryable() || ctx.is_cancelled() {
                break err;
            }

            let Some(delay) = cfg.retry_delay(attempt - 1) else {
                continue;
            };
            bus.publish(
                Event::new(EventKind::BackoffScheduled)
                    .with_task(task.name())
                    .with_attempt(attempt)
                    .with_delay(delay)
                    .with_error(err.to_string()),
            );

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            tokio::select! {
                _ = &mut sleep => {}
                _ = ctx.cancelled() => break err,
            }
        };

        Err(self.exhausted(task, attempt, err))
    }

    fn exhausted(&self, task: &dyn Task, attempts: u32, source: TaskError) -> PoolError {
        tracing::debug!(
            task = task.name(),
            attempts,
            error = %source,
            worker = self.id,
            "task failed"
        );
        self.shared.bus.publish(
            Event::new(EventKind::RetriesExhausted)
                .with_task(task.name())
                .with_attempt(attempts)
                .with_error(source.to_string()),
        );
        PoolError::Task {
            task: task.name().to_string(),
            attempts,
            source,
        }
    }
}
