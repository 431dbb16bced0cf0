//! # Error collector
//!
//! [`ErrorCollector`] is the pool's append-only error aggregate. Workers add the
//! final error of every failed task, submitters add queue-full refusals, and
//! callers read copies at any time, including while tasks are still running.
//!
//! ## Rules
//! - Every mutation and every snapshot happens under one mutex; an `add` is never
//!   observed half-done.
//! - Order is completion order across workers, not submission order.
//! - [`ErrorCollector::snapshot`] returns a copy; mutating it never touches the collector.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::PoolError;

/// Concurrency-safe, append-only list of errors.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errs: Mutex<Vec<PoolError>>,
}

impl ErrorCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error.
    pub fn add(&self, err: PoolError) {
        self.lock().push(err);
    }

    /// Appends the error of `res`, if any; `Ok` is ignored.
    pub fn record<T>(&self, res: Result<T, PoolError>) {
        if let Err(err) = res {
            self.add(err);
        }
    }

    /// Returns a copy of every error added so far.
    pub fn snapshot(&self) -> Vec<PoolError> {
        self.lock().clone()
    }

    /// Number of errors added so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Nothing panics while the lock is held.
    fn lock(&self) -> MutexGuard<'_, Vec<PoolError>> {
        self.errs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
