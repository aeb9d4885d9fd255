// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain events replayed into [`crate::MaterializedState`] (§4.D).
//!
//! The WAL stores these, not `TaskRun`/`RunEvent` directly: a task's
//! lifecycle is a sequence of small deltas, and replaying deltas is what
//! makes the durable queue's CAS-guarded transitions recoverable after a
//! crash mid-write.

use serde::{Deserialize, Serialize};
use strmsync_core::{ErrorKind, RunEvent, TaskFileCounts, TaskRunId, WorkerId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageEvent {
    TaskEnqueued {
        task: strmsync_core::TaskRun,
    },
    TaskClaimed {
        id: TaskRunId,
        worker_id: WorkerId,
        started_at: u64,
        attempts: u32,
    },
    TaskCompleted {
        id: TaskRunId,
        ended_at: u64,
        duration_secs: u64,
        files: TaskFileCounts,
    },
    /// A failure. When `next_available_at` is `Some`, the task returns to
    /// `Pending` for a retry; when `None`, the failure is terminal.
    TaskFailed {
        id: TaskRunId,
        ended_at: u64,
        error_message: String,
        error_kind: ErrorKind,
        next_available_at: Option<u64>,
    },
    TaskCancelled {
        id: TaskRunId,
        ended_at: u64,
    },
    RunEventAppended {
        event: RunEvent,
    },
    /// Emitted by `Queue::recover_stale`: a `Running` row aged past the
    /// stale threshold is requeued.
    TaskRecovered {
        id: TaskRunId,
        available_at: u64,
    },
}

impl StorageEvent {
    pub fn task_enqueued(task: strmsync_core::TaskRun) -> Self {
        StorageEvent::TaskEnqueued { task }
    }
}
