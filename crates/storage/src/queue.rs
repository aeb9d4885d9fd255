// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable, polling-based, single-node task queue (§4.D).
//!
//! `Queue` owns a [`Wal`] + [`MaterializedState`] pair: every mutation is
//! first appended to the WAL, then folded into the in-memory state. All
//! calls are synchronous (`std::fs` I/O under a single lock); callers from
//! the async engine/daemon crates invoke them directly rather than through
//! `spawn_blocking`, since queue operations are small, infrequent relative
//! to file I/O elsewhere, and already serialized by the queue's own lock.

use crate::checkpoint::{CheckpointError, Checkpointer};
use crate::event::StorageEvent;
use crate::snapshot::SnapshotError;
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use parking_lot::Mutex;
use std::path::PathBuf;
use strmsync_core::{ErrorKind, IdGen, JobId, Priority, RunEvent, TaskRun, TaskRunId, TaskStatus, WorkerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("task not found: {0}")]
    NotFound(TaskRunId),
    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    /// A non-terminal task already holds `dedup_key` (§4.D Enqueue).
    #[error("duplicate task: dedup_key already held by {0}")]
    DuplicateTask(TaskRunId),
    /// `claim_next` was called with an empty `worker_id` (§4.D Claim).
    #[error("missing worker id")]
    MissingWorkerId,
}

/// Base unit of the retry backoff schedule (§4.D): `backoff(n) = min(10n s, 5 min)`.
const BACKOFF_STEP_SECS: u64 = 10;
const BACKOFF_MAX_SECS: u64 = 5 * 60;

pub fn backoff_secs(attempts: u32) -> u64 {
    (BACKOFF_STEP_SECS * attempts as u64).min(BACKOFF_MAX_SECS)
}

#[derive(Debug, Clone, Default)]
pub struct EnqueueOptions {
    pub priority: Priority,
    pub dedup_key: Option<String>,
    pub max_attempts: u32,
    pub available_at: Option<u64>,
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
}

/// The durable task queue (§4.D). Construction replays the snapshot (if
/// any) then the WAL tail to rebuild `MaterializedState` before serving
/// any call.
pub struct Queue<G: IdGen> {
    inner: Mutex<Inner>,
    checkpointer: Checkpointer,
    id_gen: G,
}

impl<G: IdGen> Queue<G> {
    /// Open (or create) the queue's WAL and snapshot at `data_dir`,
    /// replaying both into a fresh `MaterializedState`.
    pub fn open(data_dir: PathBuf, id_gen: G) -> Result<Self, QueueError> {
        let snapshot_path = data_dir.join("snapshot.zst");
        let wal_path = data_dir.join("wal.jsonl");

        let snapshot = crate::checkpoint::load_snapshot(&snapshot_path)?;
        let (mut state, processed_seq) = match snapshot {
            Some(s) => (s.state, s.seq),
            None => (MaterializedState::default(), 0),
        };

        let wal = Wal::open(&wal_path)?;
        for entry in wal.entries_after(processed_seq)? {
            state.apply(&entry.event);
        }

        Ok(Self {
            inner: Mutex::new(Inner { wal, state }),
            checkpointer: Checkpointer::new(snapshot_path),
            id_gen,
        })
    }

    fn write(&self, inner: &mut Inner, event: StorageEvent) -> Result<(), QueueError> {
        inner.wal.append(&event)?;
        inner.wal.flush()?;
        inner.state.apply(&event);
        Ok(())
    }

    /// Enqueue a new task run for `job_id`. When `opts.dedup_key` matches
    /// an already non-terminal task, the enqueue is rejected with
    /// [`QueueError::DuplicateTask`] naming that task rather than creating
    /// a duplicate (§4.D dedup).
    pub fn enqueue(
        &self,
        job_id: JobId,
        now_ms: u64,
        opts: EnqueueOptions,
    ) -> Result<TaskRunId, QueueError> {
        let mut inner = self.inner.lock();

        if let Some(key) = &opts.dedup_key {
            if let Some(existing) = inner.state.dedup_index.get(key) {
                return Err(QueueError::DuplicateTask(existing.clone()));
            }
        }

        let id = TaskRunId::new(self.id_gen.next());
        let mut task = TaskRun::new_pending(id.clone(), job_id, now_ms);
        task.priority = opts.priority;
        task.dedup_key = opts.dedup_key;
        if opts.max_attempts > 0 {
            task.max_attempts = opts.max_attempts;
        }
        task.available_at = opts.available_at.unwrap_or(now_ms);

        self.write(&mut inner, StorageEvent::TaskEnqueued { task })?;
        Ok(id)
    }

    /// Claim the highest-priority, earliest-available pending task (§4.D).
    /// CAS-guarded by holding the queue lock across the read-decide-write
    /// sequence, so two concurrent callers can never claim the same row.
    pub fn claim_next(
        &self,
        worker_id: WorkerId,
        now_ms: u64,
    ) -> Result<Option<TaskRun>, QueueError> {
        if worker_id.as_str().is_empty() {
            return Err(QueueError::MissingWorkerId);
        }
        let mut inner = self.inner.lock();
        let Some(candidate) = inner.state.claimable(now_ms).first().map(|t| t.id.clone()) else {
            return Ok(None);
        };
        let attempts = inner
            .state
            .tasks
            .get(&candidate)
            .map(|t| t.attempts + 1)
            .unwrap_or(1);

        self.write(
            &mut inner,
            StorageEvent::TaskClaimed {
                id: candidate.clone(),
                worker_id,
                started_at: now_ms,
                attempts,
            },
        )?;
        Ok(inner.state.tasks.get(&candidate).cloned())
    }

    pub fn complete(
        &self,
        id: &TaskRunId,
        now_ms: u64,
        files: strmsync_core::TaskFileCounts,
    ) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        let task = inner
            .state
            .tasks
            .get(id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))?;
        require_transition(task.status, TaskStatus::Completed)?;
        let duration_secs = TaskRun::clamp_duration_secs(task.started_at.unwrap_or(now_ms), now_ms);

        self.write(
            &mut inner,
            StorageEvent::TaskCompleted {
                id: id.clone(),
                ended_at: now_ms,
                duration_secs,
                files,
            },
        )
    }

    /// Fail a running task. Retries when attempts remain and the error is
    /// retryable; otherwise the failure is terminal (§4.D, §7).
    pub fn fail(
        &self,
        id: &TaskRunId,
        now_ms: u64,
        error_message: impl Into<String>,
        error_kind: ErrorKind,
    ) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        let task = inner
            .state
            .tasks
            .get(id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))?;
        require_transition(task.status, TaskStatus::Failed)?;

        let retryable = error_kind == ErrorKind::Retryable && task.attempts < task.max_attempts;
        let next_available_at =
            retryable.then(|| now_ms + backoff_secs(task.attempts) * 1000);

        self.write(
            &mut inner,
            StorageEvent::TaskFailed {
                id: id.clone(),
                ended_at: now_ms,
                error_message: error_message.into(),
                error_kind,
                next_available_at,
            },
        )
    }

    pub fn cancel(&self, id: &TaskRunId, now_ms: u64) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        let task = inner
            .state
            .tasks
            .get(id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))?;
        require_transition(task.status, TaskStatus::Cancelled)?;

        self.write(
            &mut inner,
            StorageEvent::TaskCancelled {
                id: id.clone(),
                ended_at: now_ms,
            },
        )
    }

    pub fn get(&self, id: &TaskRunId) -> Option<TaskRun> {
        self.inner.lock().state.tasks.get(id).cloned()
    }

    pub fn list(&self) -> Vec<TaskRun> {
        self.inner.lock().state.tasks.values().cloned().collect()
    }

    pub fn append_run_event(&self, event: RunEvent) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        self.write(&mut inner, StorageEvent::RunEventAppended { event })
    }

    pub fn run_events(&self) -> Vec<RunEvent> {
        self.inner.lock().state.run_events.clone()
    }

    /// Requeue `Running` rows whose `started_at` predates `now_ms` by more
    /// than `stale_after_secs`, returning how many were recovered. Daemon
    /// startup calls this once, explicitly, before the worker pool starts
    /// claiming.
    pub fn recover_stale(&self, now_ms: u64, stale_after_secs: u64) -> Result<usize, QueueError> {
        let mut inner = self.inner.lock();
        let stale = inner.state.stale_running(now_ms, stale_after_secs);
        for id in &stale {
            self.write(
                &mut inner,
                StorageEvent::TaskRecovered {
                    id: id.clone(),
                    available_at: now_ms,
                },
            )?;
        }
        Ok(stale.len())
    }

    /// Trigger a background checkpoint and, once durable, truncate the
    /// WAL (§4.D, `Checkpointer` design notes).
    pub fn checkpoint(&self) -> Result<(), QueueError> {
        let (seq, state) = {
            let inner = self.inner.lock();
            (inner.wal.write_seq(), inner.state.clone())
        };
        let handle = self.checkpointer.start(seq, &state);
        handle.wait()?;

        let mut inner = self.inner.lock();
        inner.wal.truncate_before(seq)?;
        Ok(())
    }
}

fn require_transition(from: TaskStatus, to: TaskStatus) -> Result<(), QueueError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(QueueError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
