// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay (§4.D).

use crate::event::StorageEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strmsync_core::{RunEvent, TaskRun, TaskRunId, TaskStatus};

/// Bound on the in-memory run-event log kept alongside the snapshot; older
/// entries are dropped FIFO rather than growing without bound (§4.H note:
/// `RunEventSink` is the durable-enough record for observability, not the
/// audit trail).
const MAX_RETAINED_RUN_EVENTS: usize = 10_000;

/// The task queue's durable state, rebuilt by replaying [`StorageEvent`]s
/// onto a snapshot (§4.D).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub tasks: HashMap<TaskRunId, TaskRun>,
    /// dedup_key → id of the non-terminal task already holding it, so a
    /// duplicate `Enqueue` resolves to the same run instead of a new one.
    #[serde(default)]
    pub dedup_index: HashMap<String, TaskRunId>,
    #[serde(default)]
    pub run_events: Vec<RunEvent>,
}

impl MaterializedState {
    pub fn apply(&mut self, event: &StorageEvent) {
        match event {
            StorageEvent::TaskEnqueued { task } => {
                if let Some(key) = &task.dedup_key {
                    self.dedup_index.insert(key.clone(), task.id.clone());
                }
                self.tasks.insert(task.id.clone(), task.clone());
            }
            StorageEvent::TaskClaimed {
                id,
                worker_id,
                started_at,
                attempts,
            } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.status = TaskStatus::Running;
                    task.worker_id = Some(worker_id.clone());
                    task.started_at = Some(*started_at);
                    task.attempts = *attempts;
                }
            }
            StorageEvent::TaskCompleted {
                id,
                ended_at,
                duration_secs,
                files,
            } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.status = TaskStatus::Completed;
                    task.ended_at = Some(*ended_at);
                    task.duration_secs = Some(*duration_secs);
                    task.files = *files;
                    self.clear_dedup_for(id);
                }
            }
            StorageEvent::TaskFailed {
                id,
                ended_at,
                error_message,
                error_kind,
                next_available_at,
            } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.ended_at = Some(*ended_at);
                    task.error_message = Some(error_message.clone());
                    task.error_kind = Some(*error_kind);
                    match next_available_at {
                        Some(at) => {
                            task.status = TaskStatus::Pending;
                            task.available_at = *at;
                            task.worker_id = None;
                        }
                        None => {
                            task.status = TaskStatus::Failed;
                            self.clear_dedup_for(id);
                        }
                    }
                }
            }
            StorageEvent::TaskCancelled { id, ended_at } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.status = TaskStatus::Cancelled;
                    task.ended_at = Some(*ended_at);
                    self.clear_dedup_for(id);
                }
            }
            StorageEvent::TaskRecovered { id, available_at } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.status = TaskStatus::Pending;
                    task.available_at = *available_at;
                    task.worker_id = None;
                }
            }
            StorageEvent::RunEventAppended { event } => {
                self.run_events.push(event.clone());
                if self.run_events.len() > MAX_RETAINED_RUN_EVENTS {
                    let overflow = self.run_events.len() - MAX_RETAINED_RUN_EVENTS;
                    self.run_events.drain(0..overflow);
                }
            }
        }
    }

    fn clear_dedup_for(&mut self, id: &TaskRunId) {
        self.dedup_index.retain(|_, v| v != id);
    }

    /// Pending tasks whose `available_at` has elapsed, ordered by priority
    /// then by `available_at` (earliest first) per the claim ordering §4.D
    /// implies for a single-node polling queue.
    pub fn claimable(&self, now_ms: u64) -> Vec<&TaskRun> {
        let mut candidates: Vec<&TaskRun> = self
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending && t.available_at <= now_ms)
            .collect();
        candidates.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.available_at.cmp(&b.available_at))
        });
        candidates
    }

    /// `Running` tasks whose `started_at` is older than `stale_after_secs`.
    pub fn stale_running(&self, now_ms: u64, stale_after_secs: u64) -> Vec<TaskRunId> {
        let threshold_ms = stale_after_secs.saturating_mul(1000);
        self.tasks
            .values()
            .filter(|t| t.status == TaskStatus::Running)
            .filter(|t| {
                t.started_at
                    .is_some_and(|started| now_ms.saturating_sub(started) > threshold_ms)
            })
            .map(|t| t.id.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
