//! # Result handle for tasks submitted with a typed producer.
//!
//! [`TaskFuture<T>`] is a single-assignment cell: exactly one writer (the pool,
//! through a crate-private [`Completer`]) sets the outcome once, and any number of
//! readers observe it through [`TaskFuture::get`].
//!
//! ## States
//! ```text
//! pending ──complete(outcome)──► completed (terminal)
//!    │
//!    └──completer dropped──────► completed with TaskError::Abandoned
//! ```
//!
//! ## Rules
//! - Completion consumes the [`Completer`], so a second completion cannot be written.
//! - A completer dropped without completing (the task never ran) completes the
//!   future with [`TaskError::Abandoned`]; readers never wait on a dead task.
//! - `get` does not poll: waiters sleep on a `tokio::sync::watch` channel and are
//!   all woken by the single completion.
//! - A `get` that loses against its cancellation token returns
//!   [`TaskError::Canceled`] and leaves the future pending for other readers.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

type Slot<T> = Option<Result<T, TaskError>>;

/// Creates a connected completer/future pair.
pub(crate) fn pair<T>() -> (Completer<T>, TaskFuture<T>) {
    let (tx, rx) = watch::channel(None);
    (Completer { tx: Some(tx) }, TaskFuture { rx })
}

/// Write side of a [`TaskFuture`].
pub(crate) struct Completer<T> {
    tx: Option<watch::Sender<Slot<T>>>,
}

impl<T> Completer<T> {
    /// Stores the outcome and wakes every reader.
    pub(crate) fn complete(mut self, outcome: Result<T, TaskError>) {
        if let Some(tx) = self.tx.take() {
            tx.send_replace(Some(outcome));
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            tx.send_replace(Some(Err(TaskError::Abandoned)));
        }
    }
}

/// Read side of a submitted producer's outcome.
///
/// Cheap to clone; every clone observes the same outcome.
///
/// # Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use taskpool::{Config, Pool, TaskError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = Pool::new(2, Config::default().with_queue_capacity(8))?;
/// let token = CancellationToken::new();
/// pool.run(&token);
///
/// let fut = pool
///     .submit_with_result("answer", |_ctx: CancellationToken| async { Ok::<_, TaskError>(42u32) })
///     .await;
///
/// assert_eq!(fut.get(&token).await, Ok(42));
/// pool.wait().await;
/// # Ok(())
/// # }
/// ```
pub struct TaskFuture<T> {
    rx: watch::Receiver<Slot<T>>,
}

impl<T> Clone for TaskFuture<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for TaskFuture<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskFuture")
            .field("done", &self.is_done())
            .finish()
    }
}

impl<T: Clone> TaskFuture<T> {
    /// Waits for the outcome, or for `ctx` to be cancelled.
    ///
    /// - completion first (or both already happened) → the stored outcome;
    /// - `ctx` cancelled first → `Err(TaskError::Canceled)`; the future stays
    ///   pending and a later `get` can still observe the real outcome.
    pub async fn get(&self, ctx: &CancellationToken) -> Result<T, TaskError> {
        let mut rx = self.rx.clone();
        tokio::select! {
            biased;
            slot = rx.wait_for(Option::is_some) => match slot {
                Ok(slot) => match &*slot {
                    Some(outcome) => outcome.clone(),
                    None => Err(TaskError::Abandoned),
                },
                Err(_closed) => Err(TaskError::Abandoned),
            },
            _ = ctx.cancelled() => Err(TaskError::Canceled),
        }
    }

    /// Returns the outcome if it is already available, without waiting.
    pub fn try_get(&self) -> Option<Result<T, TaskError>> {
        self.rx.borrow().clone()
    }
}

impl<T> TaskFuture<T> {
    /// Returns `true` once the outcome has been stored.
    pub fn is_done(&self) -> bool {
        self.rx.borrow().is_some()
    }
}
