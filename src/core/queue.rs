//! # Task queue
//!
//! [`TaskQueue`] is the single channel between submitters and workers. It is a
//! multi-producer/multi-consumer FIFO (`async_channel`) with two admission modes:
//!
//! - **Buffered** (`capacity > 0`): a bounded buffer of `capacity` items.
//! - **Hand-off** (`capacity == 0`): no buffer. A push is admitted only when a
//!   worker is currently waiting in [`TaskQueue::pop`]. Waiting workers announce
//!   themselves on a `ready` semaphore; a push consumes one announcement before
//!   sending, so items in flight never exceed waiting workers.
//!
//! ## Hand-off scheme
//! ```text
//! worker:  pop() ── ready += 1 ──► recv() ──► item      (announcement used up)
//!                                     └─ dropped early ─► ready -= 1 (withdraw)
//! push():  ready.acquire() ──► send(item)
//! try_push(): ready.try_acquire() ─ none ─► Full
//! ```
//!
//! ## Closing
//! [`TaskQueue::close`] flips a flag exactly once; only the first caller closes the
//! channel and the ready gate. After closing, pushes fail with `Closed`, and pops
//! return the remaining items, then `None`.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Semaphore, TryAcquireError};

/// Why a push did not enqueue; carries the item back.
#[derive(Debug)]
pub(crate) enum PushError<T> {
    /// No room right now (buffer full, or no worker waiting for a hand-off).
    Full(T),
    /// The queue has been closed.
    Closed(T),
}

/// Bounded MPMC queue with an optional synchronous hand-off gate.
#[derive(Debug)]
pub(crate) struct TaskQueue<T> {
    tx: async_channel::Sender<T>,
    rx: async_channel::Receiver<T>,
    ready: Option<Semaphore>,
    closed: AtomicBool,
}

impl<T> TaskQueue<T> {
    /// Creates a queue with `capacity` buffered slots; `0` selects hand-off mode,
    /// sized for at most `consumers` simultaneous receivers.
    pub(crate) fn new(capacity: usize, consumers: usize) -> Self {
        let (slots, ready) = match capacity {
            0 => (consumers.max(1), Some(Semaphore::new(0))),
            n => (n, None),
        };
        let (tx, rx) = async_channel::bounded(slots);
        Self {
            tx,
            rx,
            ready,
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueues `item`, waiting for room.
    pub(crate) async fn push(&self, item: T) -> Result<(), PushError<T>> {
        if let Some(ready) = &self.ready {
            match ready.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_closed) => return Err(PushError::Closed(item)),
            }
        }
        self.tx
            .send(item)
            .await
            .map_err(|e| PushError::Closed(e.into_inner()))
    }

    /// Enqueues `item` only if that is possible without waiting.
    pub(crate) fn try_push(&self, item: T) -> Result<(), PushError<T>> {
        if let Some(ready) = &self.ready {
            match ready.try_acquire() {
                Ok(permit) => permit.forget(),
                Err(TryAcquireError::NoPermits) => return Err(PushError::Full(item)),
                Err(TryAcquireError::Closed) => return Err(PushError::Closed(item)),
            }
        }
        self.tx.try_send(item).map_err(|e| match e {
            async_channel::TrySendError::Full(item) => PushError::Full(item),
            async_channel::TrySendError::Closed(item) => PushError::Closed(item),
        })
    }

    /// Dequeues the next item, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained. Cancel-safe: a pop
    /// dropped before receiving withdraws its hand-off announcement.
    pub(crate) async fn pop(&self) -> Option<T> {
        let announce = self.ready.as_ref().map(Announce::new);
        let item = self.rx.recv().await.ok();
        if item.is_some() {
            if let Some(announce) = announce {
                announce.used();
            }
        }
        item
    }

    /// Removes every item currently queued without waiting.
    pub(crate) fn drain(&self) -> Vec<T> {
        std::iter::from_fn(|| self.rx.try_recv().ok()).collect()
    }

    /// Closes the queue. Returns `true` only for the call that actually closed it.
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(ready) = &self.ready {
            ready.close();
        }
        self.tx.close();
        true
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of items waiting in the queue.
    pub(crate) fn len(&self) -> usize {
        self.rx.len()
    }
}

/// A worker's "ready to receive" announcement in hand-off mode.
struct Announce<'a> {
    ready: &'a Semaphore,
    armed: bool,
}

impl<'a> Announce<'a> {
    fn new(ready: &'a Semaphore) -> Self {
        ready.add_permits(1);
        Self { ready, armed: true }
    }

    /// The announcement was matched by a push.
    fn used(mut self) {
        self.armed = false;
    }
}

impl Drop for Announce<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // If a pusher already took the permit its item stays queued until
        // another pop (or a drain) picks it up.
        if let Ok(permit) = self.ready.try_acquire() {
            permit.forget();
        }
    }
}
