//! Pool events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by a pool, its workers and its
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Pool::submit` (admission), workers (attempts, lifecycle),
//!   `Pool::wait` (queue closure), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener spawned by `Pool::run` (fans out to
//!   `SubscriberSet`), and any receiver from [`Pool::subscribe`](crate::Pool::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
