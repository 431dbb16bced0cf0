use std::{
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use taskpool::{
    Config, Event, EventKind, Pool, PoolError, PoolState, QueueFullPolicy, Subscribe, TaskError,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("operation hung")
}

/// Submits a task that signals `started` and then blocks until `release` fires.
async fn submit_blocker(pool: &Pool, started: &Arc<Notify>, release: &Arc<Notify>) {
    let (started, release) = (Arc::clone(started), Arc::clone(release));
    pool.submit_fn("blocker", move |_ctx: CancellationToken| {
        let (started, release) = (Arc::clone(&started), Arc::clone(&release));
        async move {
            started.notify_one();
            release.notified().await;
            Ok::<(), TaskError>(())
        }
    })
    .await
    .unwrap();
}

fn counting(name: &str, pool: &Pool, hits: &Arc<AtomicUsize>) -> impl Future<Output = Result<(), PoolError>> {
    let hits = Arc::clone(hits);
    pool.submit_fn(name.to_string(), move |_ctx: CancellationToken| {
        let hits = Arc::clone(&hits);
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok::<(), TaskError>(())
        }
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_submitted_task_runs_once() {
    let pool = Pool::new(4, Config::default().with_queue_capacity(8)).unwrap();
    let token = CancellationToken::new();
    pool.run(&token);

    let hits = Arc::new(AtomicUsize::new(0));
    for i in 0..50 {
        within(counting(&format!("t{i}"), &pool, &hits)).await.unwrap();
    }
    within(pool.wait()).await;

    assert_eq!(hits.load(Ordering::SeqCst), 50);
    assert_eq!(pool.pending(), 0);
    assert_eq!(pool.state(), PoolState::Stopped);
    assert!(pool.errors().is_empty());
}

#[tokio::test]
async fn always_failing_task_gets_retry_plus_one_attempts() {
    let cfg = Config::default()
        .with_retry(3)
        .with_retry_delay(Duration::from_millis(1))
        .with_queue_capacity(1);
    let pool = Pool::new(1, cfg).unwrap();
    pool.run(&CancellationToken::new());

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    pool.submit_fn("always-fails", move |_ctx: CancellationToken| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TaskError::fail("nope"))
        }
    })
    .await
    .unwrap();
    within(pool.wait()).await;

    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert_eq!(
        pool.errors(),
        vec![PoolError::Task {
            task: "always-fails".into(),
            attempts: 4,
            source: TaskError::fail("nope"),
        }]
    );
}

#[tokio::test]
async fn success_stops_retrying() {
    let pool = Pool::new(1, Config::default().with_retry(5).with_queue_capacity(1)).unwrap();
    pool.run(&CancellationToken::new());

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    pool.submit_fn("second-time-lucky", move |_ctx: CancellationToken| {
        let counter = Arc::clone(&counter);
        async move {
            match counter.fetch_add(1, Ordering::SeqCst) + 1 {
                1 => Err(TaskError::fail("cold cache")),
                _ => Ok(()),
            }
        }
    })
    .await
    .unwrap();
    within(pool.wait()).await;

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert!(pool.errors().is_empty());
}

#[tokio::test]
async fn fatal_error_is_not_retried() {
    let pool = Pool::new(1, Config::default().with_retry(5).with_queue_capacity(1)).unwrap();
    pool.run(&CancellationToken::new());

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    pool.submit_fn("bad-input", move |_ctx: CancellationToken| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TaskError::fatal("malformed"))
        }
    })
    .await
    .unwrap();
    within(pool.wait()).await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    let errs = pool.errors();
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].task_error(), Some(&TaskError::fatal("malformed")));
}

#[tokio::test]
async fn panicking_task_does_not_take_down_the_worker() {
    let pool = Pool::new(1, Config::default().with_retry(2).with_queue_capacity(16)).unwrap();
    pool.run(&CancellationToken::new());

    pool.submit_fn("explodes", |_ctx: CancellationToken| async {
        if true {
            panic!("index out of range");
        }
        Ok::<(), TaskError>(())
    })
    .await
    .unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    for i in 0..5 {
        counting(&format!("after-{i}"), &pool, &hits).await.unwrap();
    }
    within(pool.wait()).await;

    assert_eq!(hits.load(Ordering::SeqCst), 5);
    let errs = pool.errors();
    assert_eq!(errs.len(), 1);
    assert!(errs[0].is_panic());
    assert!(errs[0].to_string().contains("task panic: index out of range"));
    assert!(matches!(errs[0], PoolError::Task { attempts: 1, .. }));
}

#[tokio::test]
async fn error_snapshots_are_copies() {
    let pool = Pool::new(2, Config::default().with_queue_capacity(4)).unwrap();
    pool.run(&CancellationToken::new());

    for i in 0..3 {
        pool.submit_fn(format!("fail-{i}"), |_ctx: CancellationToken| async {
            Err::<(), _>(TaskError::fail("x"))
        })
        .await
        .unwrap();
    }
    within(pool.wait()).await;

    let mut snapshot = pool.errors();
    assert_eq!(snapshot.len(), 3);
    snapshot.clear();
    assert_eq!(pool.errors().len(), 3);
}

#[tokio::test]
async fn result_future_delivers_value_to_every_reader() {
    let pool = Pool::new(2, Config::default()).unwrap();
    let token = CancellationToken::new();
    pool.run(&token);

    let fut = within(pool.submit_with_result("answer", |_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<_, TaskError>(String::from("forty-two"))
    }))
    .await;

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let fut = fut.clone();
            let token = token.clone();
            tokio::spawn(async move { fut.get(&token).await })
        })
        .collect();
    for reader in readers {
        assert_eq!(within(reader).await.unwrap(), Ok("forty-two".to_string()));
    }
    assert_eq!(fut.get(&token).await, Ok("forty-two".to_string()));

    within(pool.wait()).await;
}

#[tokio::test]
async fn expired_token_read_returns_canceled() {
    let pool = Pool::new(1, Config::default().with_queue_capacity(1)).unwrap();
    pool.run(&CancellationToken::new());
    let release = Arc::new(Notify::new());

    let gate = Arc::clone(&release);
    let fut = pool
        .submit_with_result("gated", move |_ctx: CancellationToken| {
            let gate = Arc::clone(&gate);
            async move {
                gate.notified().await;
                Ok::<_, TaskError>(7u8)
            }
        })
        .await;

    let expired = CancellationToken::new();
    expired.cancel();
    assert_eq!(fut.get(&expired).await, Err(TaskError::Canceled));

    release.notify_one();
    assert_eq!(within(fut.get(&CancellationToken::new())).await, Ok(7));
    within(pool.wait()).await;
}

#[tokio::test]
async fn result_future_sees_final_attempt_after_retries() {
    let pool = Pool::new(1, Config::default().with_retry(2).with_queue_capacity(1)).unwrap();
    let token = CancellationToken::new();
    pool.run(&token);

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    let fut = pool
        .submit_with_result("eventually", move |_ctx: CancellationToken| {
            let counter = Arc::clone(&counter);
            async move {
                match counter.fetch_add(1, Ordering::SeqCst) + 1 {
                    n if n < 3 => Err(TaskError::fail(format!("try {n}"))),
                    n => Ok(n),
                }
            }
        })
        .await;

    assert_eq!(within(fut.get(&token)).await, Ok(3));
    within(pool.wait()).await;
    assert!(pool.errors().is_empty());
}

#[tokio::test]
async fn panicking_producer_fails_future_and_is_recorded() {
    let pool = Pool::new(1, Config::default().with_queue_capacity(1)).unwrap();
    let token = CancellationToken::new();
    pool.run(&token);

    let fut = pool
        .submit_with_result("bad-producer", |_ctx: CancellationToken| async {
            if true {
                panic!("producer bug");
            }
            Ok::<u32, TaskError>(0)
        })
        .await;

    assert_eq!(
        within(fut.get(&token)).await,
        Err(TaskError::Panicked {
            message: "producer bug".into()
        })
    );
    within(pool.wait()).await;
    assert!(pool.errors().iter().any(PoolError::is_panic));
}

#[tokio::test]
async fn wait_policy_blocks_until_a_slot_frees() {
    let pool = Arc::new(Pool::new(1, Config::default().with_queue_capacity(1)).unwrap());
    pool.run(&CancellationToken::new());
    let (started, release) = (Arc::new(Notify::new()), Arc::new(Notify::new()));

    submit_blocker(&pool, &started, &release).await;
    within(started.notified()).await;

    let hits = Arc::new(AtomicUsize::new(0));
    within(counting("fills-the-slot", &pool, &hits)).await.unwrap();

    let waiting = {
        let pool = Arc::clone(&pool);
        let hits = Arc::clone(&hits);
        tokio::spawn(async move { counting("waits", &pool, &hits).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiting.is_finished());

    release.notify_one();
    assert_eq!(within(waiting).await.unwrap(), Ok(()));
    within(pool.wait()).await;

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(pool.errors().is_empty());
}

#[tokio::test]
async fn discard_policy_drops_silently() {
    let cfg = Config::default()
        .with_queue_capacity(1)
        .with_queue_full(QueueFullPolicy::Discard);
    let pool = Pool::new(1, cfg).unwrap();
    pool.run(&CancellationToken::new());
    let mut events = pool.subscribe();
    let (started, release) = (Arc::new(Notify::new()), Arc::new(Notify::new()));

    submit_blocker(&pool, &started, &release).await;
    within(started.notified()).await;

    let hits = Arc::new(AtomicUsize::new(0));
    counting("queued", &pool, &hits).await.unwrap();
    assert_eq!(counting("dropped", &pool, &hits).await, Ok(()));

    let fut = pool
        .submit_with_result("dropped-result", |_ctx: CancellationToken| async {
            Ok::<_, TaskError>(1u8)
        })
        .await;
    assert_eq!(fut.try_get(), Some(Err(TaskError::Abandoned)));

    release.notify_one();
    within(pool.wait()).await;

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(pool.errors().is_empty());

    let mut discarded = Vec::new();
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::TaskDiscarded {
            discarded.push(ev.task.as_deref().map(str::to_owned));
        }
    }
    assert_eq!(
        discarded,
        vec![Some("dropped".to_string()), Some("dropped-result".to_string())]
    );
}

#[tokio::test]
async fn return_error_policy_refuses_and_records() {
    let cfg = Config::default()
        .with_queue_capacity(1)
        .with_queue_full(QueueFullPolicy::ReturnError);
    let pool = Pool::new(1, cfg).unwrap();
    pool.run(&CancellationToken::new());
    let (started, release) = (Arc::new(Notify::new()), Arc::new(Notify::new()));

    submit_blocker(&pool, &started, &release).await;
    within(started.notified()).await;

    let hits = Arc::new(AtomicUsize::new(0));
    counting("queued", &pool, &hits).await.unwrap();

    let refused = counting("refused", &pool, &hits).await;
    assert_eq!(
        refused,
        Err(PoolError::QueueFull {
            task: "refused".into()
        })
    );
    assert_eq!(pool.pending(), 2);

    let fut = pool
        .submit_with_result("refused-result", |_ctx: CancellationToken| async {
            Ok::<_, TaskError>(1u8)
        })
        .await;
    assert!(matches!(fut.try_get(), Some(Err(TaskError::Rejected { .. }))));

    release.notify_one();
    within(pool.wait()).await;

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let errs = pool.errors();
    assert_eq!(errs.len(), 2);
    assert!(errs.iter().all(|e| matches!(e, PoolError::QueueFull { .. })));
}

#[tokio::test]
async fn hand_off_refuses_when_no_worker_is_idle() {
    let cfg = Config::default()
        .with_queue_capacity(0)
        .with_queue_full(QueueFullPolicy::ReturnError);
    let pool = Pool::new(1, cfg).unwrap();
    pool.run(&CancellationToken::new());
    let (started, release) = (Arc::new(Notify::new()), Arc::new(Notify::new()));

    // Give the worker time to start waiting for a hand-off.
    tokio::time::sleep(Duration::from_millis(20)).await;
    submit_blocker(&pool, &started, &release).await;
    within(started.notified()).await;

    let hits = Arc::new(AtomicUsize::new(0));
    assert!(matches!(
        counting("no-taker", &pool, &hits).await,
        Err(PoolError::QueueFull { .. })
    ));

    release.notify_one();
    within(pool.wait()).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_waits_both_return() {
    let pool = Arc::new(Pool::new(2, Config::default().with_queue_capacity(4)).unwrap());
    pool.run(&CancellationToken::new());

    let hits = Arc::new(AtomicUsize::new(0));
    for i in 0..6 {
        counting(&format!("t{i}"), &pool, &hits).await.unwrap();
    }

    let a = tokio::spawn({
        let pool = Arc::clone(&pool);
        async move { pool.wait().await }
    });
    let b = tokio::spawn({
        let pool = Arc::clone(&pool);
        async move { pool.wait().await }
    });
    within(a).await.unwrap();
    within(b).await.unwrap();
    within(pool.wait()).await;

    assert_eq!(hits.load(Ordering::SeqCst), 6);
    assert_eq!(
        counting("late", &pool, &hits).await,
        Err(PoolError::Closed)
    );
}

#[tokio::test]
async fn cancellation_drains_queued_tasks_as_canceled() {
    let pool = Pool::new(1, Config::default().with_queue_capacity(4)).unwrap();
    let token = CancellationToken::new();
    pool.run(&token);
    let started = Arc::new(Notify::new());

    let signal = Arc::clone(&started);
    pool.submit_fn("long-running", move |ctx: CancellationToken| {
        let signal = Arc::clone(&signal);
        async move {
            signal.notify_one();
            ctx.cancelled().await;
            Ok::<(), TaskError>(())
        }
    })
    .await
    .unwrap();
    within(started.notified()).await;

    let hits = Arc::new(AtomicUsize::new(0));
    for i in 0..3 {
        counting(&format!("queued-{i}"), &pool, &hits).await.unwrap();
    }

    token.cancel();
    within(pool.wait()).await;

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(pool.pending(), 0);
    assert_eq!(pool.state(), PoolState::Stopped);

    let errs = pool.errors();
    assert_eq!(errs.len(), 3);
    for err in &errs {
        assert!(matches!(
            err,
            PoolError::Task {
                attempts: 0,
                source: TaskError::Canceled,
                ..
            }
        ));
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<EventKind>>);

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.0.lock().unwrap().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn subscribers_observe_attempts_and_shutdown() {
    let recorder = Arc::new(Recorder::default());
    let pool = Pool::builder(1)
        .with_retry(1)
        .with_queue_capacity(2)
        .with_subscribers(vec![recorder.clone()])
        .build()
        .unwrap();
    pool.run(&CancellationToken::new());

    pool.submit_fn("fails-twice", |_ctx: CancellationToken| async {
        Err::<(), _>(TaskError::fail("down"))
    })
    .await
    .unwrap();
    within(pool.wait()).await;

    within(async {
        while !recorder.0.lock().unwrap().contains(&EventKind::PoolStopped) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    let seen = recorder.0.lock().unwrap().clone();
    let starts = seen.iter().filter(|k| **k == EventKind::TaskStarting).count();
    assert_eq!(starts, 2);
    assert!(seen.contains(&EventKind::TaskFailed));
    assert!(seen.contains(&EventKind::RetriesExhausted));
    assert!(seen.contains(&EventKind::QueueClosed));
    assert_eq!(seen.last(), Some(&EventKind::PoolStopped));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn raw_events_have_unique_sequence_numbers() {
    let pool = Pool::new(4, Config::default().with_queue_capacity(4)).unwrap();
    let mut rx = pool.subscribe();
    pool.run(&CancellationToken::new());

    let hits = Arc::new(AtomicUsize::new(0));
    for i in 0..20 {
        within(counting(&format!("t{i}"), &pool, &hits)).await.unwrap();
    }
    within(pool.wait()).await;

    let mut seqs = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        seqs.push(ev.seq);
    }
    assert!(!seqs.is_empty());
    let received = seqs.len();
    seqs.sort_unstable();
    seqs.dedup();
    assert_eq!(seqs.len(), received);
}

#[tokio::test]
async fn caller_retrying_on_queue_full_lets_workers_drain() {
    let cfg = Config::default()
        .with_queue_capacity(1)
        .with_queue_full(QueueFullPolicy::ReturnError);
    let pool = Pool::new(1, cfg).unwrap();
    pool.run(&CancellationToken::new());

    let hits = Arc::new(AtomicUsize::new(0));
    counting("first", &pool, &hits).await.unwrap();
    within(async {
        loop {
            match counting("second", &pool, &hits).await {
                Ok(()) => break,
                Err(PoolError::QueueFull { .. }) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    })
    .await;
    within(pool.wait()).await;

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(pool.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn retry_pauses_add_up_to_the_configured_delay() {
    let cfg = Config::default()
        .with_retry(2)
        .with_retry_delay(Duration::from_millis(50))
        .with_queue_capacity(1);
    let pool = Pool::new(1, cfg).unwrap();
    pool.run(&CancellationToken::new());

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    let start = tokio::time::Instant::now();
    pool.submit_fn("flaky", move |_ctx: CancellationToken| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TaskError::Fail { error: "nope".into() })
        }
    })
    .await
    .unwrap();
    within(pool.wait()).await;
    let elapsed = start.elapsed();

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(elapsed >= Duration::from_millis(100), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(101), "elapsed {elapsed:?}");
}

const SUBMITTERS: usize = 8;
const PER_SUBMITTER: usize = 100;
const TOTAL: usize = SUBMITTERS * PER_SUBMITTER;

fn stress_pool(capacity: usize, policy: QueueFullPolicy) -> Arc<Pool> {
    let cfg = Config::default()
        .with_queue_capacity(capacity)
        .with_queue_full(policy)
        .with_bus_capacity(8192);
    let pool = Arc::new(Pool::new(4, cfg).unwrap());
    pool.run(&CancellationToken::new());
    pool
}

/// Submits `TOTAL` counting tasks from concurrent submitters; returns how many were accepted.
async fn flood(pool: &Arc<Pool>, hits: &Arc<AtomicUsize>) -> usize {
    let mut set = tokio::task::JoinSet::new();
    for s in 0..SUBMITTERS {
        let (pool, hits) = (Arc::clone(pool), Arc::clone(hits));
        set.spawn(async move {
            let mut accepted = 0;
            for i in 0..PER_SUBMITTER {
                if counting(&format!("s{s}-{i}"), &pool, &hits).await.is_ok() {
                    accepted += 1;
                }
            }
            accepted
        });
    }

    let mut accepted = 0;
    while let Some(res) = set.join_next().await {
        accepted += res.unwrap();
    }
    accepted
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submitters_with_wait_policy_run_everything() {
    for capacity in [0, 4] {
        let pool = stress_pool(capacity, QueueFullPolicy::Wait);
        let hits = Arc::new(AtomicUsize::new(0));

        let accepted = within(flood(&pool, &hits)).await;
        within(pool.wait()).await;

        assert_eq!(accepted, TOTAL, "capacity {capacity}");
        assert_eq!(hits.load(Ordering::SeqCst), accepted, "capacity {capacity}");
        assert_eq!(pool.pending(), 0);
        assert!(pool.errors().is_empty());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submitters_with_return_error_account_for_refusals() {
    for capacity in [0, 4] {
        let pool = stress_pool(capacity, QueueFullPolicy::ReturnError);
        let hits = Arc::new(AtomicUsize::new(0));

        let accepted = within(flood(&pool, &hits)).await;
        within(pool.wait()).await;

        assert_eq!(hits.load(Ordering::SeqCst), accepted, "capacity {capacity}");
        let errors = pool.errors();
        assert_eq!(errors.len(), TOTAL - accepted, "capacity {capacity}");
        assert!(errors.iter().all(|e| matches!(e, PoolError::QueueFull { .. })));
        assert_eq!(pool.pending(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submitters_with_discard_account_for_drops() {
    for capacity in [0, 4] {
        let pool = stress_pool(capacity, QueueFullPolicy::Discard);
        let mut rx = pool.subscribe();
        let hits = Arc::new(AtomicUsize::new(0));

        let accepted = within(flood(&pool, &hits)).await;
        within(pool.wait()).await;

        let mut discarded = 0;
        loop {
            match rx.try_recv() {
                Ok(ev) if ev.kind == EventKind::TaskDiscarded => discarded += 1,
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::TryRecvError::Lagged(n)) => {
                    panic!("lost {n} events")
                }
                Err(_) => break,
            }
        }

        assert_eq!(accepted, TOTAL, "capacity {capacity}");
        assert_eq!(hits.load(Ordering::SeqCst) + discarded, TOTAL, "capacity {capacity}");
        assert_eq!(pool.pending(), 0);
        assert!(pool.errors().is_empty());
    }
}
