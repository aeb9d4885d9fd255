// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron scheduler (§4.F): one cron subscription per enabled, cron-managed
//! job, each driving a tick handler that enqueues a task with a
//! minute-bucketed dedup key.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use cron::Schedule;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::AbortHandle;

use strmsync_core::{Clock, IdGen, Job, JobId, Priority};
use strmsync_storage::{EnqueueOptions, Queue};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid cron expression '{expr}': {message}")]
    InvalidCron { expr: String, message: String },
}

/// Maintains `job_id -> cron subscription` (§4.F). `UpsertJob`/`RemoveJob`
/// are serialised by the internal lock on `handles`; `Start`/`Stop` are
/// idempotent.
pub struct Scheduler<G: IdGen, C: Clock> {
    queue: Arc<Queue<G>>,
    clock: C,
    handles: Mutex<HashMap<JobId, AbortHandle>>,
}

impl<G: IdGen + 'static, C: Clock> Scheduler<G, C> {
    pub fn new(queue: Arc<Queue<G>>, clock: C) -> Arc<Self> {
        Arc::new(Self {
            queue,
            clock,
            handles: Mutex::new(HashMap::new()),
        })
    }

    /// Subscribe every enabled, cron-managed job (§4.F `Start`). Jobs with
    /// an invalid cron expression are skipped with a warning rather than
    /// aborting startup for the whole set.
    pub fn start(self: &Arc<Self>, jobs: Vec<Job>) {
        for job in jobs {
            if let Err(e) = self.upsert_job(&job) {
                tracing::warn!(job = %job.id, error = %e, "job not scheduled");
            }
        }
    }

    /// Replace (or remove) `job`'s subscription based on its current
    /// enabled/cron state (§4.F `UpsertJob`).
    pub fn upsert_job(self: &Arc<Self>, job: &Job) -> Result<(), SchedulerError> {
        self.remove_job(&job.id);
        if !job.is_cron_managed() {
            return Ok(());
        }
        let expr = job.cron.clone().unwrap_or_default();
        let schedule = Schedule::from_str(&expr).map_err(|e| SchedulerError::InvalidCron {
            expr: expr.clone(),
            message: e.to_string(),
        })?;

        let scheduler = self.clone();
        let job_id = job.id.clone();
        let abort_handle = tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    break;
                };
                let Ok(duration) = (next - Utc::now()).to_std() else {
                    continue;
                };
                tokio::time::sleep(duration).await;
                scheduler.tick(&job_id);
            }
        })
        .abort_handle();

        self.handles.lock().insert(job.id.clone(), abort_handle);
        Ok(())
    }

    /// Unsubscribe `job_id` if present (§4.F `RemoveJob`).
    pub fn remove_job(&self, job_id: &JobId) {
        if let Some(handle) = self.handles.lock().remove(job_id) {
            handle.abort();
        }
    }

    /// Unsubscribe everything (§4.F `Stop`). In-flight tick handlers only
    /// call `Enqueue`, a fast local write, so no deadline is needed beyond
    /// aborting the timer tasks themselves.
    pub fn stop(&self) {
        for (_, handle) in self.handles.lock().drain() {
            handle.abort();
        }
    }

    /// Enqueue one task for `job_id`, deduped to the current minute bucket
    /// so two ticks landing in the same minute collapse to one run (§4.F
    /// tick handler). `ErrDuplicateTask` is expected whenever a prior tick
    /// (or a manual `RunOnce`) already holds the bucket's dedup key and is
    /// swallowed rather than logged as a failure (§7 propagation policy).
    fn tick(&self, job_id: &JobId) {
        let now = self.clock.epoch_ms();
        let minute_bucket = (now / 60_000) * 60_000;
        let dedup_key = format!("{job_id}:{minute_bucket}");
        match self.queue.enqueue(
            job_id.clone(),
            now,
            EnqueueOptions {
                priority: Priority::Normal,
                dedup_key: Some(dedup_key),
                max_attempts: 0,
                available_at: Some(now),
            },
        ) {
            Ok(_) | Err(strmsync_storage::QueueError::DuplicateTask(_)) => {}
            Err(e) => {
                tracing::error!(job = %job_id, error = %e, "scheduler tick enqueue failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
