//! Pool core: queue, workers and lifecycle.
//!
//! The public API from this module is [`Pool`] (with [`PoolBuilder`] and
//! [`PoolState`]), its [`Config`] and the [`ErrorCollector`] it records into.
//!
//! Internal modules:
//! - [`queue`]: bounded MPMC task queue with a synchronous hand-off mode;
//! - [`pending`]: outstanding-task counter released by drop;
//! - [`runner`]: executes one attempt inside a panic guard and publishes its outcome;
//! - [`worker`]: dequeues tasks and applies retries and backoff;
//! - [`pool`]: owns the shared state, submission and shutdown.

mod builder;
mod collector;
mod config;
mod pending;
mod pool;
mod queue;
mod runner;
mod worker;

pub(crate) use runner::panic_message;

pub use builder::PoolBuilder;
pub use collector::ErrorCollector;
pub use config::Config;
pub use pool::{Pool, PoolState};
