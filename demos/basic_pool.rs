//! # Example: basic_pool
//!
//! Runs a batch of jobs on a small pool. Some jobs are flaky and succeed after
//! a retry, one always fails, one panics. The pool survives all of them and
//! reports the final errors once everything is done.
//!
//! ## Flow
//! ```text
//! Pool::new(3, cfg) ──► run(&token)
//!   ├─► submit_fn("job-0") ... submit_fn("job-9")
//!   │     ├─ flaky jobs: attempt 1 Err(Fail) ──► sleep 50ms ──► attempt 2 Ok
//!   │     ├─ "job-7": Err(Fatal) ──► recorded, no retry
//!   │     └─ "job-9": panic ──► recorded as "task panic: ...", worker keeps going
//!   └─► wait() ──► errors()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_pool
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use taskpool::{Config, Pool, QueueFullPolicy, TaskError};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Three workers, one retry after 50ms, a small buffered queue.
    let cfg = Config::default()
        .with_retry(1)
        .with_retry_delay(Duration::from_millis(50))
        .with_queue_capacity(4)
        .with_queue_full(QueueFullPolicy::Wait);

    let pool = Pool::new(3, cfg)?;
    let token = CancellationToken::new();
    pool.run(&token);

    // 2. Submit jobs; `submit_fn` waits while the queue is full.
    for i in 0..10u32 {
        let attempts = Arc::new(AtomicU32::new(0));
        pool.submit_fn(format!("job-{i}"), move |_ctx: CancellationToken| {
            let attempts = Arc::clone(&attempts);
            async move {
                let n = attempts.fetch_add(1, Ordering::Relaxed) + 1;
                tokio::time::sleep(Duration::from_millis(20)).await;
                match i {
                    7 => Err(TaskError::fatal("bad input")),
                    9 => panic!("job-{i} hit a bug"),
                    _ if i % 3 == 0 && n == 1 => Err(TaskError::fail("flaky upstream")),
                    _ => {
                        println!("[job-{i}] done on attempt {n}");
                        Ok(())
                    }
                }
            }
        })
        .await?;
    }

    // 3. Wait for everything, then look at what went wrong.
    pool.wait().await;

    for err in pool.errors() {
        println!("[main] {} ({})", err, err.as_label());
    }
    println!("[main] state: {:?}", pool.state());
    Ok(())
}
