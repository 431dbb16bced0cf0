//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable) and the shared
//! handle type [`TaskRef`], an `Arc<dyn Task>` suitable for handing to a pool.
//!
//! A task receives a [`CancellationToken`] and should check it to stop
//! cooperatively when the pool's run token is cancelled. The pool never aborts
//! an attempt that is already running.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Boxed future returned by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// # Shared handle to a task object.
///
/// This is what [`Pool::submit`](crate::Pool::submit) accepts.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit of work.
///
/// A `Task` has a human-readable [`name`](Task::name) (used in errors, events and
/// logs) and a [`spawn`](Task::spawn) method producing a **fresh** future per
/// attempt. A task that is retried is spawned once per attempt.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use taskpool::{BoxTaskFuture, Task, TaskError};
///
/// struct Ping;
///
/// impl Task for Ping {
///     fn name(&self) -> &str { "ping" }
///
///     fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Creates the future for one attempt.
    ///
    /// Implementations should check `ctx.is_cancelled()` and exit quickly to
    /// honor shutdown.
    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture;
}
