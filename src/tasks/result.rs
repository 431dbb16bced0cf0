//! # Producer adapter behind `Pool::submit_with_result`.
//!
//! [`ResultTask`] wraps a value producer `Fn(CancellationToken) -> Future<Output = Result<T, TaskError>>`
//! into a plain [`Task`]. Each attempt stores its outcome; the [`TaskFuture`] is
//! completed **once**, with the outcome of the last attempt, when the task is
//! released by the worker (dropped after its final attempt).
//!
//! ```text
//! attempt 1 ──► Err(Fail) ──► store ─┐
//! attempt 2 ──► Ok(v)     ──► store ─┤
//!                                    ▼
//! worker drops task ──► finish() ──► completer.complete(Ok(v))
//! ```
//!
//! A task that never ran (refused, discarded, drained) has nothing stored; its
//! completer is dropped with the last reference and the future reads
//! [`TaskError::Abandoned`], unless the submitter rejected it explicitly.

use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::panic_message;
use crate::error::{PoolError, TaskError};

use super::future::{Completer, TaskFuture, pair};
use super::task::{BoxTaskFuture, Task};

/// Shared between the task and the submitter.
pub(crate) struct Outcome<T> {
    last: Mutex<Option<Result<T, TaskError>>>,
    completer: Mutex<Option<Completer<T>>>,
}

impl<T> Outcome<T> {
    fn store(&self, res: Result<T, TaskError>) {
        *lock(&self.last) = Some(res);
    }

    /// Completes the future with the last stored outcome, if any attempt ran.
    fn finish(&self) {
        let Some(last) = lock(&self.last).take() else {
            return;
        };
        if let Some(completer) = lock(&self.completer).take() {
            completer.complete(last);
        }
    }

    /// Completes the future with the submission error.
    pub(crate) fn reject(&self, err: PoolError) {
        if let Some(completer) = lock(&self.completer).take() {
            completer.complete(Err(err.into()));
        }
    }
}

fn lock<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A value producer running as a pool task.
pub(crate) struct ResultTask<T, F> {
    name: Cow<'static, str>,
    f: F,
    outcome: Arc<Outcome<T>>,
}

impl<T, F> ResultTask<T, F> {
    /// Wraps `f`; returns the task, the submitter's handle on its outcome and
    /// the caller-facing future.
    pub(crate) fn new<Fut>(
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> (Arc<Self>, Arc<Outcome<T>>, TaskFuture<T>)
    where
        F: Fn(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, TaskError>>,
    {
        let (completer, fut) = pair();
        let outcome = Arc::new(Outcome {
            last: Mutex::new(None),
            completer: Mutex::new(Some(completer)),
        });
        let task = Arc::new(Self {
            name: name.into(),
            f,
            outcome: Arc::clone(&outcome),
        });
        (task, outcome, fut)
    }
}

impl<T, F> Drop for ResultTask<T, F> {
    fn drop(&mut self) {
        self.outcome.finish();
    }
}

impl<T, Fnc, Fut> Task for ResultTask<T, Fnc>
where
    T: Send + Sync + 'static,
    Fnc: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
        let outcome = Arc::clone(&self.outcome);
        let created = std::panic::catch_unwind(AssertUnwindSafe(|| (self.f)(ctx)));

        Box::pin(async move {
            let res = match created {
                Ok(fut) => match AssertUnwindSafe(fut).catch_unwind().await {
                    Ok(res) => res,
                    Err(payload) => Err(TaskError::Panicked {
                        message: panic_message(payload.as_ref()),
                    }),
                },
                Err(payload) => Err(TaskError::Panicked {
                    message: panic_message(payload.as_ref()),
                }),
            };
            let status = match &res {
                Ok(_) => Ok(()),
                Err(e) => Err(e.clone()),
            };
            outcome.store(res);
            status
        })
    }
}
