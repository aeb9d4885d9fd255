// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TaskRun: a single attempt to execute a Job (§3), and its state machine (§4.D).

use crate::error::ErrorKind;
use crate::job::JobId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a task run.
    #[derive(Default)]
    pub struct TaskRunId;
}

crate::define_id! {
    /// Identifier a worker registers itself under when claiming tasks.
    pub struct WorkerId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High = 1,
    Normal = 2,
    Low = 3,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Terminal statuses never mutate further (§3 invariant).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Whether `self -> to` is an allowed transition per the state machine table (§4.D).
    pub fn can_transition_to(&self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, to),
            (Pending, Running)
                | (Pending, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Running, Pending)
                | (Failed, Pending)
                | (Failed, Running)
        )
    }
}

/// Aggregate per-file counters persisted on a TaskRun (§3, §8 invariant).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFileCounts {
    pub added: u64,
    pub updated: u64,
    pub deleted: u64,
    pub failed: u64,
}

/// A single attempt to execute a Job (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRun {
    pub id: TaskRunId,
    pub job_id: JobId,
    pub priority: Priority,
    pub status: TaskStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    /// Epoch milliseconds after which this task may be claimed.
    pub available_at: u64,
    pub started_at: Option<u64>,
    pub ended_at: Option<u64>,
    /// Duration in seconds, clamped non-negative (§4.D, §9).
    pub duration_secs: Option<u64>,
    pub worker_id: Option<WorkerId>,
    pub dedup_key: Option<String>,
    pub error_message: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub files: TaskFileCounts,
    /// Optional bounded event list for RunIncremental (paths relative to source root).
    pub incremental_events: Option<Vec<crate::remote_entry::IncrementalEvent>>,
}

impl TaskRun {
    /// Build a fresh pending TaskRun with the queue's enqueue defaults applied (§4.D).
    pub fn new_pending(id: TaskRunId, job_id: JobId, now_ms: u64) -> Self {
        Self {
            id,
            job_id,
            priority: Priority::Normal,
            status: TaskStatus::Pending,
            attempts: 0,
            max_attempts: 3,
            available_at: now_ms,
            started_at: None,
            ended_at: None,
            duration_secs: None,
            worker_id: None,
            dedup_key: None,
            error_message: None,
            error_kind: None,
            files: TaskFileCounts::default(),
            incremental_events: None,
        }
    }

    /// Clamped non-negative duration in seconds between two epoch-ms timestamps (§9).
    pub fn clamp_duration_secs(started_at_ms: u64, ended_at_ms: u64) -> u64 {
        ended_at_ms.saturating_sub(started_at_ms) / 1000
    }
}

#[cfg(test)]
#[path = "task_run_tests.rs"]
mod tests;
