//! # Event subscribers for a pool.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] that
//! fans pool events out to every registered subscriber.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Worker / submit() ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                                   │
//!                                                        ┌──────────┼──────────┐
//!                                                        ▼          ▼          ▼
//!                                                   [queue S1] [queue S2] [queue SN]
//!                                                        │          │          │
//!                                                   on_event() on_event()  on_event()
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use taskpool::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! #[derive(Default)]
//! struct PanicCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for PanicCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TaskPanicked {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "panic-counter" }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod embedded;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
