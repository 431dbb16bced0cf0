//! # Task abstractions and result handles.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for implementing async cancelable tasks
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskFuture`] - typed outcome of a task submitted with a result

mod future;
mod result;
mod task;
mod task_fn;

pub(crate) use result::ResultTask;

pub use future::TaskFuture;
pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::TaskFn;
