//! # Example: result_futures
//!
//! Submits value producers with [`Pool::submit_with_result`] and reads their
//! outcomes through [`TaskFuture`]s, with pool events rendered by the built-in
//! `LogWriter` subscriber.
//!
//! Shows:
//! - several readers of one future seeing the same value;
//! - a read bounded by a short-lived token returning `Canceled` while the
//!   producer keeps running;
//! - a refused submission (`ReturnError` on a full queue) completing its future
//!   immediately with `Rejected`.
//!
//! ## Run
//! ```bash
//! RUST_LOG=taskpool=debug cargo run --example result_futures --features logging
//! ```

use std::{sync::Arc, time::Duration};

use taskpool::{Config, LogWriter, Pool, QueueFullPolicy, Subscribe, TaskError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskpool=debug")),
        )
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let pool = Pool::builder(2)
        .with_config(
            Config::default()
                .with_queue_capacity(1)
                .with_queue_full(QueueFullPolicy::ReturnError),
        )
        .with_subscribers(subs)
        .build()?;

    let token = CancellationToken::new();
    pool.run(&token);

    // 1. A slow producer; read it with a short deadline first.
    let slow = pool
        .submit_with_result("slow-sum", |_ctx: CancellationToken| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok::<u64, TaskError>((1..=100).sum())
        })
        .await;

    let deadline = CancellationToken::new();
    let timer = deadline.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        timer.cancel();
    });
    println!("[main] early read: {:?}", slow.get(&deadline).await);

    // 2. Several readers of the same outcome.
    let readers: Vec<_> = (0..3)
        .map(|i| {
            let fut = slow.clone();
            let token = token.clone();
            tokio::spawn(async move { (i, fut.get(&token).await) })
        })
        .collect();
    for reader in readers {
        let (i, res) = reader.await?;
        println!("[reader-{i}] {res:?}");
    }

    // 3. Fill both workers and the one-slot queue, then overflow it.
    let mut futs = Vec::new();
    for i in 0..4 {
        let fut = pool
            .submit_with_result(format!("square-{i}"), move |_ctx: CancellationToken| async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<u64, TaskError>(i * i)
            })
            .await;
        futs.push(fut);
    }
    for (i, fut) in futs.iter().enumerate() {
        println!("[square-{i}] {:?}", fut.get(&token).await);
    }

    pool.wait().await;
    for err in pool.errors() {
        println!("[main] recorded: {err}");
    }
    Ok(())
}
