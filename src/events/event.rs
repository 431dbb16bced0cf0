//! # Events emitted by a pool and its workers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Admission events**: what happened to a submission that did not reach a worker
//! - **Attempt events**: per-attempt execution flow (starting, stopped, failed, panicked, backoff)
//! - **Pool lifecycle events**: workers starting and stopping, queue closure
//! - **Subscriber events**: problems delivering events to subscribers
//!
//! The [`Event`] struct carries optional metadata such as task name, attempt,
//! backoff delay and error text.
//!
//! ## Ordering guarantees
//! Each event published through a pool's [`Bus`](crate::events::Bus) gets a
//! sequence number (`seq`) from that bus, unique per pool. Events published
//! concurrently may be received out of `seq` order, so `seq` is a reorder key
//! rather than a delivery order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_task("fetch")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(250))
//!     .with_error("connection reset");
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.task.as_deref(), Some("fetch"));
//! assert_eq!(ev.delay_ms, Some(250));
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Classification of pool events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission events ===
    /// Queue was full and the task was dropped (`QueueFullPolicy::Discard`).
    ///
    /// Sets: `task`
    TaskDiscarded,

    /// Queue was full and the task was refused (`QueueFullPolicy::ReturnError`).
    ///
    /// Sets: `task`, `error`
    TaskRejected,

    /// Task was still queued when the run token was cancelled; it never ran.
    ///
    /// Sets: `task`
    TaskDrained,

    // === Attempt events ===
    /// A worker is starting an attempt.
    ///
    /// Sets: `task`, `attempt` (1-based), `worker`
    TaskStarting,

    /// Attempt succeeded; the task is finished.
    ///
    /// Sets: `task`, `attempt`, `worker`
    TaskStopped,

    /// Attempt returned an error.
    ///
    /// Sets: `task`, `attempt`, `error`, `worker`
    TaskFailed,

    /// Attempt panicked; the panic was caught and the worker keeps running.
    ///
    /// Sets: `task`, `attempt`, `error` (panic message), `worker`
    TaskPanicked,

    /// Next attempt scheduled after a failure.
    ///
    /// Sets: `task`, `attempt` (the failed one), `delay_ms`, `error`
    BackoffScheduled,

    /// The task ended in error and the error was recorded in the collector.
    ///
    /// Sets: `task`, `attempt` (last one), `error`
    RetriesExhausted,

    // === Pool lifecycle events ===
    /// A worker entered its loop.
    ///
    /// Sets: `worker`
    WorkerStarted,

    /// A worker left its loop (queue closed or run token cancelled).
    ///
    /// Sets: `worker`
    WorkerStopped,

    /// The task queue was closed (exactly once per pool).
    QueueClosed,

    /// Every worker has exited; the pool is stopped.
    PoolStopped,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `error` (panic message)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `error` (reason)
    SubscriberOverflow,
}

/// Pool event with optional metadata.
///
/// - `seq`: unique per-bus sequence, usable to reorder events
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Sequence number assigned by the bus on publish.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Error text (task error, panic message, overflow reason).
    pub error: Option<Arc<str>>,
    /// Index of the worker that produced the event.
    pub worker: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind stamped with the current time.
    ///
    /// The sequence number is assigned when the event is published.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            task: None,
            attempt: None,
            delay_ms: None,
            error: None,
            worker: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches error text.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches the producing worker's index.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_error(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_error(info)
    }

    /// Returns `true` for events describing subscriber delivery problems.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
