//! Retry and admission policies.
//!
//! This module groups the knobs that control **how long** a worker waits
//! between attempts of a failing task and **what happens** when a submission
//! meets a full queue.
//!
//! ## Contents
//! - [`BackoffPolicy`]   how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]    randomization of retry delays
//! - [`QueueFullPolicy`] wait / discard / return-error on a full queue
//!
//! ## Quick wiring
//! ```text
//! Config { retry, backoff: BackoffPolicy, queue_capacity, queue_full: QueueFullPolicy }
//!      ├─► core::worker  uses backoff.next(attempt) between attempts
//!      └─► Pool::submit  uses queue_full when the queue cannot take a task right now
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → no delay at all (zero, constant, no jitter).
//! - `QueueFullPolicy::Wait` → submitters wait, nothing is ever dropped.

mod backoff;
mod jitter;
mod queue_full;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use queue_full::QueueFullPolicy;
