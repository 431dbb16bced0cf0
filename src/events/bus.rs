//! # Event bus for broadcasting pool events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from many sources (workers, submitters, the pool).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                  Listener (one per pool):
//!   Worker 1  ──┐
//!   Worker N  ──┼──────► Bus ───────► subscriber listener ────► SubscriberSet
//!   submit()  ──┤  (broadcast chan)    (spawned by Pool::run)
//!   wait()    ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **Sequenced**: every published event gets a unique sequence number from this bus.
//!   Concurrent publishers may deliver events out of `seq` order; sort by `seq` to reorder.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for pool events.
///
/// Cheap to clone; clones share the channel and the sequence counter.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
    seq: Arc<AtomicU64>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamps the event with the next sequence number and sends it to all receivers.
    ///
    /// If there are no receivers the event is dropped.
    pub fn publish(&self, mut ev: Event) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        ev.seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver observing events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
