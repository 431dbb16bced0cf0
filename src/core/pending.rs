//! # Outstanding-task counter
//!
//! [`Pending`] counts tasks that were accepted but have not finished yet. It is
//! the pool's "wait for everything" primitive.
//!
//! Every increment is represented by a [`Ticket`]; dropping the ticket is the
//! matching decrement. A ticket travels with its task through the queue to a
//! worker, so any path that loses the task (refusal, discard, drain, worker
//! finishing) releases the count exactly once without extra bookkeeping.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared counter of accepted-but-unfinished tasks.
#[derive(Debug)]
pub(crate) struct Pending {
    count: watch::Sender<usize>,
}

impl Pending {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            count: watch::Sender::new(0),
        })
    }

    /// Registers one outstanding task.
    pub(crate) fn ticket(self: &Arc<Self>) -> Ticket {
        self.count.send_modify(|n| *n += 1);
        Ticket {
            pending: Arc::clone(self),
        }
    }

    /// Current number of outstanding tasks.
    pub(crate) fn get(&self) -> usize {
        *self.count.borrow()
    }

    /// Waits until no task is outstanding.
    pub(crate) async fn wait_zero(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

/// One outstanding task; released on drop.
#[derive(Debug)]
pub(crate) struct Ticket {
    pending: Arc<Pending>,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.pending.count.send_modify(|n| {
            debug_assert!(*n > 0, "ticket released twice");
            *n = n.saturating_sub(1);
        });
    }
}
