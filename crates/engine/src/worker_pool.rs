// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool (§4.E): a fixed number of loops each claiming, executing,
//! and completing/failing one task at a time against a shared [`Queue`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use strmsync_adapters::{
    ClouddriveDriver, Driver, LocalDriver, OpenlistDriver, StrmWriter,
};
use strmsync_core::{
    Clock, DataServer, DataServerKind, DataServerRepository, IdGen, JobRepository, RunEventSink,
    TaskFileCounts, TaskRun, WorkerId,
};
use strmsync_storage::Queue;

use crate::error::RuntimeError;
use crate::sync::SyncEngine;

/// Tunables for a [`WorkerPool`] (§4.E).
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub worker_count: usize,
    pub poll_interval: Duration,
    pub task_timeout: Option<Duration>,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            poll_interval: Duration::from_secs(1),
            task_timeout: None,
        }
    }
}

/// Builds the right `Driver` for a configured `DataServer` (§4.A, §4.E step
/// 3). Kept as a trait so tests can swap in a fake without touching the
/// pool's claim/execute/complete loop.
pub trait DriverFactory: Send + Sync {
    fn build(&self, server: &DataServer) -> Result<Arc<dyn Driver>, RuntimeError>;
}

/// Constructs the concrete drivers from §4.A.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDriverFactory;

impl DriverFactory for DefaultDriverFactory {
    fn build(&self, server: &DataServer) -> Result<Arc<dyn Driver>, RuntimeError> {
        let rate = server.rate_limit_per_sec.unwrap_or(10) as usize;
        match server.kind {
            DataServerKind::Local => {
                let mount = server.mount_path.clone().ok_or_else(|| {
                    RuntimeError::UnsupportedDataServerKind(
                        "local data server missing mount_path".to_string(),
                    )
                })?;
                Ok(Arc::new(LocalDriver::new(mount)))
            }
            DataServerKind::Clouddrive2 => {
                Ok(Arc::new(ClouddriveDriver::new(server.base_url(), rate)))
            }
            DataServerKind::Openlist => Ok(Arc::new(OpenlistDriver::new(
                server.base_url(),
                server.credential.clone(),
                rate,
            ))),
        }
    }
}

/// A fixed-size pool of per-worker claim/execute/complete loops (§4.E).
pub struct WorkerPool<G: IdGen, C: Clock> {
    queue: Arc<Queue<G>>,
    jobs: Arc<dyn JobRepository>,
    servers: Arc<dyn DataServerRepository>,
    driver_factory: Arc<dyn DriverFactory>,
    sink: Arc<dyn RunEventSink>,
    clock: C,
    config: WorkerPoolConfig,
    cancel_handles: Mutex<HashMap<String, CancellationToken>>,
    shutdown: CancellationToken,
}

impl<G: IdGen + 'static, C: Clock> WorkerPool<G, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<Queue<G>>,
        jobs: Arc<dyn JobRepository>,
        servers: Arc<dyn DataServerRepository>,
        driver_factory: Arc<dyn DriverFactory>,
        sink: Arc<dyn RunEventSink>,
        clock: C,
        config: WorkerPoolConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            jobs,
            servers,
            driver_factory,
            sink,
            clock,
            config,
            cancel_handles: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        })
    }

    /// Spawn `config.worker_count` loops, returning their join handles.
    pub fn spawn(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        (0..self.config.worker_count)
            .map(|i| {
                let pool = self.clone();
                let worker_id = WorkerId::new(format!("worker-{i}"));
                tokio::spawn(async move { pool.worker_loop(worker_id).await })
            })
            .collect()
    }

    async fn worker_loop(self: Arc<Self>, worker_id: WorkerId) {
        loop {
            if self.shutdown.is_cancelled() {
                return;
            }
            let claimed = self.queue.claim_next(worker_id.clone(), self.clock.epoch_ms());
            match claimed {
                Ok(Some(task)) => self.execute(task).await,
                Ok(None) => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
                Err(e) => {
                    tracing::error!(worker = %worker_id, error = %e, "claim_next failed");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    async fn execute(&self, task: TaskRun) {
        let token = CancellationToken::new();
        self.cancel_handles
            .lock()
            .insert(task.id.as_str().to_string(), token.clone());

        let outcome = self.run_task(&task, token.clone()).await;
        self.cancel_handles.lock().remove(task.id.as_str());

        let now = self.clock.epoch_ms();
        match outcome {
            Ok(stats) => {
                let files = TaskFileCounts {
                    added: stats.created,
                    updated: stats.updated,
                    deleted: stats.deleted_orphans,
                    failed: stats.failed,
                };
                if let Err(e) = self.queue.complete(&task.id, now, files) {
                    tracing::error!(task = %task.id, error = %e, "queue.complete failed");
                }
            }
            Err(e) if token.is_cancelled() => {
                if let Err(qe) = self.queue.cancel(&task.id, now) {
                    tracing::error!(task = %task.id, error = %qe, "queue.cancel failed");
                }
            }
            Err(e) => {
                tracing::warn!(task = %task.id, error = %e, "task failed");
                if let Err(qe) = self.queue.fail(&task.id, now, e.to_string(), e.kind()) {
                    tracing::error!(task = %task.id, error = %qe, "queue.fail failed");
                }
            }
        }
    }

    async fn run_task(
        &self,
        task: &TaskRun,
        token: CancellationToken,
    ) -> Result<crate::stats::Stats, RuntimeError> {
        let job = self
            .jobs
            .get_by_id(&task.job_id)
            .await
            .map_err(|_| RuntimeError::JobNotFound(task.job_id.to_string()))?;
        if !job.enabled {
            return Err(RuntimeError::JobDisabled(job.id.to_string()));
        }
        let server_id = job
            .data_server_id
            .clone()
            .ok_or_else(|| RuntimeError::DataServerNotFound("none configured".to_string()))?;
        let server = self
            .servers
            .get_by_id(&server_id)
            .await
            .map_err(|_| RuntimeError::DataServerNotFound(server_id.to_string()))?;
        let driver = self.driver_factory.build(&server)?;
        let writer = Arc::new(StrmWriter::new(job.target_root.clone()));
        let engine = SyncEngine::new(driver, writer, self.sink.clone(), self.clock.clone());

        // A child token: cancelling it on timeout stops the engine's
        // in-flight work without marking `token` itself cancelled, which
        // `execute` reserves for an explicit external `Cancel(task_id)`.
        let run_token = token.child_token();
        let run = async move {
            if let Some(events) = &task.incremental_events {
                engine
                    .run_incremental(task.id.clone(), server.id.as_str(), &job, events.clone(), run_token)
                    .await
            } else {
                engine
                    .run_once(task.id.clone(), server.id.as_str(), &job, run_token)
                    .await
            }
        };

        let run = match self.config.task_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, run).await {
                Ok(result) => result,
                Err(_) => return Err(RuntimeError::TaskTimedOut(timeout)),
            },
            None => run.await,
        };
        run.map_err(RuntimeError::Sync)
    }

    /// Interrupt an in-flight task (§4.E step 4, §5 cancellation).
    pub fn cancel(&self, task_id: &str) {
        if let Some(token) = self.cancel_handles.lock().get(task_id) {
            token.cancel();
        }
    }

    /// Stop claiming new work, cancel every in-flight task, and return —
    /// callers await the join handles from [`Self::spawn`] up to their own
    /// deadline (§4.E Shutdown).
    pub fn stop(&self) {
        self.shutdown.cancel();
        for token in self.cancel_handles.lock().values() {
            token.cancel();
        }
    }
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
