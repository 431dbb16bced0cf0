//! # Run a single attempt of a task.
//!
//! Executes one attempt of a [`Task`] inside a panic guard and publishes the
//! attempt's terminal event to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success:  task.spawn() → Ok(())  → publish TaskStopped
//! Failure:  task.spawn() → Err(e)  → publish TaskFailed
//! Panic:    task.spawn() → unwind  → publish TaskPanicked → Err(Panicked)
//!           (also when the task caught its own panic and returned Err(Panicked))
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event per attempt.
//! - Both creating the attempt future and polling it happen inside the guard, so a
//!   panic anywhere in the task becomes [`TaskError::Panicked`].

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::{
    error::TaskError,
    events::{Bus, Event, EventKind},
    tasks::Task,
};

/// Executes a single attempt of `task`, publishing its terminal event to `bus`.
pub(crate) async fn run_once(
    task: &dyn Task,
    ctx: &CancellationToken,
    attempt: u32,
    worker: usize,
    bus: &Bus,
) -> Result<(), TaskError> {
    let guarded = AssertUnwindSafe(async { task.spawn(ctx.clone()).await }).catch_unwind();

    let (kind, res) = match guarded.await {
        Ok(Ok(())) => (EventKind::TaskStopped, Ok(())),
        Ok(Err(e @ TaskError::Panicked { .. })) => (EventKind::TaskPanicked, Err(e)),
        Ok(Err(e)) => (EventKind::TaskFailed, Err(e)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(task = task.name(), attempt, panic = %message, "task panicked");
            (EventKind::TaskPanicked, Err(TaskError::Panicked { message }))
        }
    };

    let mut ev = Event::new(kind)
        .with_task(task.name())
        .with_attempt(attempt)
        .with_worker(worker);
    if let Err(e) = &res {
        ev = ev.with_error(e.to_string());
    }
    bus.publish(ev);
    res
}

/// Renders a panic payload as text.
///
/// `panic!` payloads are `&'static str` or `String`; anything else is opaque.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
