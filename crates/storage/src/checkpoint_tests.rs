// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use strmsync_core::{JobId, TaskRun, TaskRunId};
use tempfile::tempdir;

fn sample_state() -> MaterializedState {
    let mut state = MaterializedState::default();
    let task = TaskRun::new_pending(TaskRunId::new("task-1"), JobId::new("job-1"), 1_700_000_000_000);
    state.tasks.insert(task.id.clone(), task);
    state
}

#[test]
fn start_runs_checkpoint_in_background_and_handle_waits() {
    let dir = tempdir().expect("tempdir");
    let snapshot_path = dir.path().join("snapshot.zst");
    let checkpointer = Checkpointer::new(snapshot_path.clone());

    let handle = checkpointer.start(3, &sample_state());
    assert_eq!(handle.seq, 3);
    let result = handle.wait().expect("checkpoint completes");
    assert_eq!(result.seq, 3);
    assert!(result.size_bytes > 0);
    assert!(snapshot_path.exists());

    let loaded = load_snapshot(&snapshot_path).expect("load").expect("some");
    assert_eq!(loaded.seq, 3);
    assert_eq!(loaded.state.tasks.len(), 1);
}

#[test]
fn load_snapshot_of_missing_path_returns_none() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("missing.zst");
    assert!(load_snapshot(&path).expect("load").is_none());
}

#[test]
fn load_snapshot_of_corrupt_file_rotates_to_bak_and_returns_none() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("snapshot.zst");
    std::fs::write(&path, b"not a zstd frame").expect("write");

    let loaded = load_snapshot(&path).expect("load");
    assert!(loaded.is_none());
    assert!(dir.path().join("snapshot.bak").exists());
}
