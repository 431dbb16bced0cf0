//! # taskpool
//!
//! **Taskpool** is a bounded-concurrency async task pool for Rust.
//!
//! A fixed group of workers pulls tasks from one bounded queue, retries failed
//! tasks with a configurable backoff, survives panicking tasks, collects every
//! final error for later inspection and hands typed results back through
//! [`TaskFuture`]s.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!    submit(task)      submit_fn(name, f)     submit_with_result(name, f) ──► TaskFuture<T>
//!         │                   │                           │
//!         ▼                   ▼                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Pool                                                             │
//! │  - Pending (outstanding tasks, released by drop)                  │
//! │  - TaskQueue (bounded MPMC, or synchronous hand-off)              │
//! │  - QueueFullPolicy: Wait / Discard / ReturnError                  │
//! │  - ErrorCollector (append-only, snapshot at any time)             │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Worker 0   │   │   Worker 1   │   │  Worker N-1  │
//!     │ (retry loop) │   │ (retry loop) │   │ (retry loop) │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ Publishes events: TaskStarting, TaskFailed, TaskPanicked,
//!      │ BackoffScheduled, RetriesExhausted, WorkerStopped, ...
//!      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                 Bus (broadcast channel, per pool)                 │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       │   (spawned by run())   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                                  ┌─────────┼─────────┐
//!                                  ▼         ▼         ▼
//!                             sub1.on   sub2.on   subN.on
//!                              _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! Pool::new ──► run(&token) ──► submit ... ──► wait()
//!
//! worker loop {
//!   ├─► pop task (or exit: token cancelled / queue closed and empty)
//!   ├─► attempt += 1, publish TaskStarting
//!   ├─► run_once(task) inside a panic guard
//!   │       ├─ Ok    ──► done
//!   │       ├─ panic ──► TaskError::Panicked, no retry
//!   │       └─ Err   ──► retry if retryable and attempts remain:
//!   │                     ├─ publish BackoffScheduled
//!   │                     └─ sleep(delay) (cancellable)
//!   ├─► final error ──► ErrorCollector + RetriesExhausted
//!   └─► drop task, release its outstanding ticket
//! }
//!
//! wait(): outstanding == 0 ──► close queue (once) ──► join workers
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                          |
//! |-------------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Pool**          | Fixed worker group, bounded queue, idempotent shutdown.          | [`Pool`], [`PoolBuilder`], [`PoolState`]    |
//! | **Tasks**         | Define tasks as functions or trait objects.                      | [`Task`], [`TaskRef`], [`TaskFn`]           |
//! | **Results**       | Typed, cancellable, multi-reader outcome of a producer.          | [`TaskFuture`]                              |
//! | **Policies**      | Retry backoff and queue-full behavior.                           | [`BackoffPolicy`], [`QueueFullPolicy`]      |
//! | **Errors**        | Typed errors, aggregated per pool.                               | [`PoolError`], [`TaskError`], [`ErrorCollector`] |
//! | **Subscriber API**| Hook into pool events (logging, metrics, custom subscribers).    | [`Subscribe`], [`Event`]                    |
//! | **Configuration** | Centralize pool settings.                                        | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskpool::{Config, Pool, QueueFullPolicy, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default()
//!         .with_retry(1)
//!         .with_retry_delay(Duration::from_millis(10))
//!         .with_queue_capacity(4)
//!         .with_queue_full(QueueFullPolicy::Wait);
//!
//!     let pool = Pool::new(2, cfg)?;
//!     let token = CancellationToken::new();
//!     pool.run(&token);
//!
//!     pool.submit_fn("hello", |_ctx: CancellationToken| async move {
//!         println!("Hello from task!");
//!         Ok::<(), TaskError>(())
//!     })
//!     .await?;
//!
//!     let answer = pool
//!         .submit_with_result("answer", |_ctx: CancellationToken| async { Ok::<_, TaskError>(42) })
//!         .await;
//!     assert_eq!(answer.get(&token).await, Ok(42));
//!
//!     pool.wait().await;
//!     assert!(pool.errors().is_empty());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{Config, ErrorCollector, Pool, PoolBuilder, PoolState};
pub use error::{PoolError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, QueueFullPolicy};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, Task, TaskFn, TaskFuture, TaskRef};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
