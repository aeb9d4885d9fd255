// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup/shutdown (§4.E, §4.F): wires the file-backed config, the
//! durable queue, the worker pool, and the cron scheduler together, then
//! waits on a signal-select loop for a clean shutdown. Single-node only —
//! no admin listener of any kind.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};

use strmsync_config::FileConfig;
use strmsync_core::{Clock, DataServerRepository, JobRepository, RunEventSink, SystemClock, UuidIdGen};
use strmsync_engine::{DefaultDriverFactory, Scheduler, WorkerPool, WorkerPoolConfig};
use strmsync_storage::{Queue, QueueEventSink};

use crate::error::DaemonError;

/// Maximum time to wait for in-flight workers to finish after a shutdown
/// signal (§4.E Shutdown: "wait up to `ctx.Deadline()`").
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(30);

/// Load `config_path`, recover any stale `running` rows left over from a
/// crash, then run the worker pool and scheduler until a termination signal
/// arrives.
pub async fn run(config_path: &Path) -> Result<(), DaemonError> {
    let config = FileConfig::load(config_path)?;
    let clock = SystemClock;

    let queue = Arc::new(Queue::open(
        std::path::PathBuf::from(&config.queue.data_dir),
        UuidIdGen,
    )?);

    let recovered = queue.recover_stale(clock.epoch_ms(), config.engine.recovery_stale_after_secs)?;
    if recovered > 0 {
        tracing::warn!(recovered, "recovered stale running tasks at startup");
    }

    let enabled_jobs = config.jobs.list_enabled().await.unwrap_or_default();
    let scheduled_job_count = enabled_jobs.iter().filter(|j| j.is_cron_managed()).count();
    let jobs: Arc<dyn JobRepository> = Arc::new(config.jobs);
    let servers: Arc<dyn DataServerRepository> = Arc::new(config.data_servers);
    let sink: Arc<dyn RunEventSink> = Arc::new(QueueEventSink::new(queue.clone()));

    let pool_config = WorkerPoolConfig {
        worker_count: config.queue.worker_count,
        poll_interval: Duration::from_secs(config.queue.poll_interval_secs),
        task_timeout: config.queue.task_timeout_secs.map(Duration::from_secs),
    };
    let pool = WorkerPool::new(
        queue.clone(),
        jobs,
        servers,
        Arc::new(DefaultDriverFactory),
        sink,
        clock.clone(),
        pool_config,
    );
    let worker_handles = pool.spawn();

    let scheduler = Scheduler::new(queue.clone(), clock);
    scheduler.start(enabled_jobs);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tracing::info!(scheduled_jobs = scheduled_job_count, "strmsync daemon ready");

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
    }

    scheduler.stop();
    pool.stop();

    let drain = async {
        for handle in worker_handles {
            let _ = handle.await;
        }
    };
    if tokio::time::timeout(SHUTDOWN_DEADLINE, drain).await.is_err() {
        tracing::warn!("worker pool did not finish within the shutdown deadline");
    }

    if let Err(e) = queue.checkpoint() {
        tracing::warn!(error = %e, "checkpoint at shutdown failed");
    }

    tracing::info!("strmsync daemon stopped");
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
