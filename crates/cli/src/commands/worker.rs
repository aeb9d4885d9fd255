// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `strmsync worker` — run a worker pool against the queue without the
//! cron scheduler, for manually draining tasks enqueued by `queue enqueue`
//! or by another process.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::signal::unix::{signal, SignalKind};

use strmsync_config::FileConfig;
use strmsync_core::{DataServerRepository, JobRepository, RunEventSink, SystemClock, UuidIdGen};
use strmsync_engine::{DefaultDriverFactory, WorkerPool, WorkerPoolConfig};
use strmsync_storage::{Queue, QueueEventSink};

#[derive(Args)]
pub struct WorkerArgs {
    /// Override the worker count from the config file
    #[arg(long)]
    pub count: Option<usize>,
}

pub async fn handle(args: WorkerArgs, config_path: &Path) -> Result<()> {
    let config = FileConfig::load(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let clock = SystemClock;

    let queue = Arc::new(
        Queue::open(std::path::PathBuf::from(&config.queue.data_dir), UuidIdGen)
            .with_context(|| format!("opening queue at {}", config.queue.data_dir))?,
    );

    let jobs: Arc<dyn JobRepository> = Arc::new(config.jobs);
    let servers: Arc<dyn DataServerRepository> = Arc::new(config.data_servers);
    let sink: Arc<dyn RunEventSink> = Arc::new(QueueEventSink::new(queue.clone()));

    let worker_count = args.count.unwrap_or(config.queue.worker_count);
    let pool_config = WorkerPoolConfig {
        worker_count,
        poll_interval: Duration::from_secs(config.queue.poll_interval_secs),
        task_timeout: config.queue.task_timeout_secs.map(Duration::from_secs),
    };
    let pool = WorkerPool::new(
        queue.clone(),
        jobs,
        servers,
        Arc::new(DefaultDriverFactory),
        sink,
        clock,
        pool_config,
    );
    let handles = pool.spawn();

    tracing::info!(workers = worker_count, "worker pool running, ctrl-c to stop");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }

    pool.stop();
    for handle in handles {
        let _ = handle.await;
    }
    queue.checkpoint()?;
    Ok(())
}
