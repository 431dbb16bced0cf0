//! # Backoff policy between retry attempts.
//!
//! [`BackoffPolicy`] decides how long a worker pauses before re-running a task
//! whose previous attempt failed. The default is **no pause**; the common case of
//! a fixed pause is [`BackoffPolicy::constant`] (what
//! [`Config::with_retry_delay`](crate::Config::with_retry_delay) sets up).
//!
//! The delay before retry `n` (0-indexed) is `first × factor^n`, clamped to `max`,
//! then jitter is applied. The base is derived from `n` alone, so jitter output
//! never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(1),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(100));
//! assert_eq!(backoff.next(1), Duration::from_millis(200));
//! assert_eq!(backoff.next(10), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`1.0` = constant).
    pub factor: f64,
    /// Jitter applied to every computed delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// No delay between attempts.
    fn default() -> Self {
        Self::constant(Duration::ZERO)
    }
}

impl BackoffPolicy {
    /// A fixed pause of `delay` between attempts, without jitter.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Exponential growth from `first`, doubling each retry, capped at `max`.
    pub fn exponential(first: Duration, max: Duration) -> Self {
        Self {
            first,
            max,
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Returns a copy with the given jitter.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns `true` if this policy never pauses.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.first.is_zero() || self.max.is_zero()
    }

    /// Computes the delay before retry number `retry` (0-indexed).
    ///
    /// Non-finite or negative intermediate values (huge exponents, odd factors)
    /// collapse to `max`.
    pub fn next(&self, retry: u32) -> Duration {
        if self.is_zero() {
            return Duration::ZERO;
        }
        let exp = retry.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}
