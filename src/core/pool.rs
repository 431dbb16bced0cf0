//! # Pool: bounded worker group over a shared task queue.
//!
//! The [`Pool`] owns the task queue, the outstanding-task counter, the error
//! collector and the event bus. [`Pool::run`] spawns a fixed number of workers
//! that pull tasks from the queue; submitters push tasks according to the
//! configured [`QueueFullPolicy`].
//!
//! ## Architecture
//! ```text
//! submit(task) ──► ticket (+1) ──► Job ──► TaskQueue ──► Worker 0..N-1
//!      │                                      │              │
//!      │ refused / discarded / closed         │              ├─► retry loop (run_once)
//!      └─► Job dropped (ticket -1)            │              ├─► final error ──► ErrorCollector
//!                                             │              └─► Job dropped (ticket -1)
//! wait() ──► pending == 0 ──► close queue ────┘
//!                               └─► join workers
//!
//! Event flow:
//!   workers / submit / wait ── publish ──► Bus ──► listener ──► SubscriberSet
//! ```
//!
//! ## States
//! ```text
//! Idle ──run()──► Running ──queue closed──► Draining ──last worker exits──► Stopped
//!   └──────────────────────queue closed before run()─────────────────────────┘
//! ```
//!
//! ## Rules
//! - A task counts as outstanding from the start of `submit` until a worker is
//!   done with it, or until the path that refused it drops it.
//! - The queue is closed exactly once, by `wait()`, by cancellation of the run
//!   token (last worker out), or by dropping the pool.
//! - No accepted task is silently lost: tasks still queued when the run token is
//!   cancelled are recorded as [`TaskError::Canceled`].

use std::borrow::Cow;
use std::future::Future;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{PoolError, TaskError},
    events::{Bus, Event, EventKind},
    policies::QueueFullPolicy,
    subscribers::{Subscribe, SubscriberSet},
    tasks::{ResultTask, TaskFn, TaskFuture, TaskRef},
};

use super::{
    builder::PoolBuilder,
    collector::ErrorCollector,
    config::Config,
    pending::{Pending, Ticket},
    queue::{PushError, TaskQueue},
    worker::Worker,
};

/// Lifecycle state of a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Built, workers not started.
    Idle,
    /// Workers started; the queue accepts tasks.
    Running,
    /// The queue is closed; workers finish what is queued and exit.
    Draining,
    /// Every worker has exited.
    Stopped,
}

impl PoolState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => PoolState::Idle,
            1 => PoolState::Running,
            2 => PoolState::Draining,
            _ => PoolState::Stopped,
        }
    }

    /// Returns a stable snake_case label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolState::Idle => "idle",
            PoolState::Running => "running",
            PoolState::Draining => "draining",
            PoolState::Stopped => "stopped",
        }
    }
}

/// A queued task together with its outstanding-count ticket.
///
/// Field order matters: the task is dropped before the ticket, so a result
/// future is completed before `wait()` can observe the task as done.
pub(crate) struct Job {
    pub(crate) task: TaskRef,
    pub(crate) ticket: Ticket,
}

/// State shared between the pool handle and its workers.
pub(crate) struct Shared {
    pub(crate) cfg: Config,
    pub(crate) queue: TaskQueue<Job>,
    pub(crate) pending: Arc<Pending>,
    pub(crate) errors: ErrorCollector,
    pub(crate) bus: Bus,
    state: AtomicU8,
    live_workers: AtomicUsize,
}

impl Shared {
    pub(crate) fn state(&self) -> PoolState {
        PoolState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: PoolState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Closes the queue once; later calls are no-ops.
    pub(crate) fn close_queue(&self) {
        if !self.queue.close() {
            return;
        }
        let _ = self.state.compare_exchange(
            PoolState::Running as u8,
            PoolState::Draining as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        let never_ran = self
            .state
            .compare_exchange(
                PoolState::Idle as u8,
                PoolState::Stopped as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        tracing::debug!(queued = self.queue.len(), "task queue closed");
        self.bus.publish(Event::new(EventKind::QueueClosed));
        if never_ran {
            tracing::debug!("pool stopped before it was run");
            self.bus.publish(Event::new(EventKind::PoolStopped));
        }
    }

    /// Called by every worker on exit; the last one out finalizes the pool.
    pub(crate) fn worker_exited(&self) {
        if self.live_workers.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        self.close_queue();
        for job in self.queue.drain() {
            let name = job.task.name().to_string();
            tracing::debug!(task = %name, "queued task canceled before it ran");
            self.bus
                .publish(Event::new(EventKind::TaskDrained).with_task(name.as_str()));
            self.errors.add(PoolError::Task {
                task: name,
                attempts: 0,
                source: TaskError::Canceled,
            });
        }
        self.set_state(PoolState::Stopped);
        tracing::debug!(errors = self.errors.len(), "pool stopped");
        self.bus.publish(Event::new(EventKind::PoolStopped));
    }
}

/// Fixed-size worker pool with a bounded queue, retries and error collection.
///
/// Share it between submitters with an `Arc<Pool>`. Dropping the pool closes
/// the queue; workers finish what is already queued and exit.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use taskpool::{Config, Pool, TaskError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cfg = Config::default()
///     .with_retry(2)
///     .with_retry_delay(Duration::from_millis(5))
///     .with_queue_capacity(16);
/// let pool = Pool::new(4, cfg)?;
/// let token = CancellationToken::new();
/// pool.run(&token);
///
/// for i in 0..8 {
///     pool.submit_fn(format!("job-{i}"), |_ctx: CancellationToken| async {
///         Ok::<(), TaskError>(())
///     })
///     .await?;
/// }
///
/// pool.wait().await;
/// assert!(pool.errors().is_empty());
/// # Ok(())
/// # }
/// ```
pub struct Pool {
    shared: Arc<Shared>,
    workers: usize,
    subscribers: Mutex<Vec<Arc<dyn Subscribe>>>,
    handles: Mutex<Option<JoinSet<()>>>,
}

impl Pool {
    /// Creates a pool with `workers` workers and the given configuration.
    ///
    /// Returns [`PoolError::InvalidWorkers`] if `workers == 0`.
    pub fn new(workers: usize, cfg: Config) -> Result<Self, PoolError> {
        Self::builder(workers).with_config(cfg).build()
    }

    /// Starts a fluent builder (configuration and subscribers).
    pub fn builder(workers: usize) -> PoolBuilder {
        PoolBuilder::new(workers)
    }

    pub(crate) fn new_internal(
        workers: usize,
        cfg: Config,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let queue = TaskQueue::new(cfg.queue_capacity, workers);
        Self {
            shared: Arc::new(Shared {
                cfg,
                queue,
                pending: Pending::new(),
                errors: ErrorCollector::new(),
                bus,
                state: AtomicU8::new(PoolState::Idle as u8),
                live_workers: AtomicUsize::new(0),
            }),
            workers,
            subscribers: Mutex::new(subscribers),
            handles: Mutex::new(None),
        }
    }

    /// Starts the workers; they stop when `ctx` is cancelled or the queue is
    /// closed and drained.
    ///
    /// Must be called from within a tokio runtime. A second call is ignored.
    pub fn run(&self, ctx: &CancellationToken) {
        if self
            .shared
            .state
            .compare_exchange(
                PoolState::Idle as u8,
                PoolState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::warn!(state = self.state().as_label(), "pool already started; run ignored");
            return;
        }

        self.subscriber_listener();

        let ctx = ctx.child_token();
        self.shared
            .live_workers
            .store(self.workers, Ordering::Release);

        let mut set = JoinSet::new();
        for id in 0..self.workers {
            let worker = Worker::new(id, Arc::clone(&self.shared));
            set.spawn(worker.run(ctx.clone()));
        }
        *lock(&self.handles) = Some(set);
        tracing::debug!(
            workers = self.workers,
            hand_off = self.shared.cfg.hand_off(),
            "pool started"
        );
    }

    /// Subscribes to the bus and forwards events to the subscriber set until
    /// the pool stops.
    fn subscriber_listener(&self) {
        let subs = std::mem::take(&mut *lock(&self.subscribers));
        if subs.is_empty() {
            return;
        }
        let set = SubscriberSet::new(subs, self.shared.bus.clone());
        let mut rx = self.shared.bus.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        set.emit(&ev);
                        if ev.kind == EventKind::PoolStopped {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        });
    }

    /// Submits a task.
    ///
    /// What happens when the queue cannot take it depends on
    /// [`Config::queue_full`]:
    /// - `Wait`: suspends until a slot (or an idle worker) is available;
    /// - `Discard`: drops the task and returns `Ok(())`;
    /// - `ReturnError`: records and returns [`PoolError::QueueFull`].
    ///
    /// Returns [`PoolError::Closed`] once the queue has been closed.
    pub async fn submit(&self, task: TaskRef) -> Result<(), PoolError> {
        let shared = &self.shared;
        let job = Job {
            ticket: shared.pending.ticket(),
            task,
        };

        let res = if shared.cfg.queue_full.is_non_blocking() {
            let res = shared.queue.try_push(job);
            // A caller looping on refusals must still let workers run.
            tokio::task::consume_budget().await;
            res
        } else {
            shared.queue.push(job).await
        };

        match res {
            Ok(()) => Ok(()),
            Err(PushError::Closed(_job)) => Err(PoolError::Closed),
            Err(PushError::Full(job)) => {
                let name = job.task.name().to_string();
                drop(job);
                match shared.cfg.queue_full {
                    QueueFullPolicy::Discard => {
                        tracing::debug!(task = %name, "queue full; task discarded");
                        shared
                            .bus
                            .publish(Event::new(EventKind::TaskDiscarded).with_task(name.as_str()));
                        Ok(())
                    }
                    QueueFullPolicy::Wait | QueueFullPolicy::ReturnError => {
                        let err = PoolError::QueueFull { task: name.clone() };
                        shared.bus.publish(
                            Event::new(EventKind::TaskRejected)
                                .with_task(name)
                                .with_error(err.to_string()),
                        );
                        shared.errors.add(err.clone());
                        Err(err)
                    }
                }
            }
        }
    }

    /// Submits a closure as a task (see [`TaskFn`]).
    pub async fn submit_fn<F, Fut>(
        &self,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Result<(), PoolError>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.submit(TaskFn::arc(name, f)).await
    }

    /// Submits a value producer and returns a future for its outcome.
    ///
    /// The producer is retried like any task; the future receives the outcome
    /// of the last attempt. If the submission is refused (queue full under
    /// `ReturnError`, or closed) the future is completed at once with
    /// [`TaskError::Rejected`]; if it is discarded, with [`TaskError::Abandoned`].
    pub async fn submit_with_result<T, F, Fut>(
        &self,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> TaskFuture<T>
    where
        T: Send + Sync + 'static,
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let (task, outcome, fut) = ResultTask::new(name, f);
        if let Err(err) = self.submit(task).await {
            outcome.reject(err);
        }
        fut
    }

    /// Waits for every outstanding task, closes the queue and joins the workers.
    ///
    /// Safe to call repeatedly and concurrently; only one caller joins the
    /// workers, the others return once nothing is outstanding.
    pub async fn wait(&self) {
        self.shared.pending.wait_zero().await;
        self.shared.close_queue();

        let set = lock(&self.handles).take();
        if let Some(mut set) = set {
            while let Some(res) = set.join_next().await {
                if let Err(err) = res {
                    tracing::error!(error = %err, "worker ended abnormally");
                }
            }
        }
    }

    /// Snapshot of every error recorded so far.
    pub fn errors(&self) -> Vec<PoolError> {
        self.shared.errors.snapshot()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PoolState {
        self.shared.state()
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of accepted tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.shared.pending.get()
    }

    /// Number of tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    /// The configuration the pool was built with.
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// Receives raw pool events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shared.close_queue();
        if let Some(mut set) = lock(&self.handles).take() {
            set.detach_all();
        }
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("workers", &self.workers)
            .field("state", &self.state())
            .field("pending", &self.pending())
            .field("closed", &self.shared.queue.is_closed())
            .finish()
    }
}

fn lock<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
