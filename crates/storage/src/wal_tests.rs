// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use strmsync_core::{JobId, TaskRun, TaskRunId};
use tempfile::tempdir;

fn sample_event(n: u32) -> StorageEvent {
    StorageEvent::TaskEnqueued {
        task: TaskRun::new_pending(
            TaskRunId::new(format!("task-{n}")),
            JobId::new("job-1"),
            1_700_000_000_000,
        ),
    }
}

#[test]
fn append_then_flush_persists_entries() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path).expect("open");

    let seq1 = wal.append(&sample_event(1)).expect("append");
    let seq2 = wal.append(&sample_event(2)).expect("append");
    assert_eq!(seq1, 1);
    assert_eq!(seq2, 2);

    wal.flush().expect("flush");

    let entries = wal.entries_after(0).expect("entries_after");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 1);
    assert_eq!(entries[1].seq, 2);
}

#[test]
fn reopening_resumes_from_persisted_write_seq() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("wal.jsonl");
    {
        let mut wal = Wal::open(&path).expect("open");
        wal.append(&sample_event(1)).expect("append");
        wal.flush().expect("flush");
    }
    let wal = Wal::open(&path).expect("reopen");
    assert_eq!(wal.write_seq(), 1);
}

#[test]
fn entries_after_only_returns_entries_past_the_given_seq() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path).expect("open");
    wal.append(&sample_event(1)).expect("append");
    wal.append(&sample_event(2)).expect("append");
    wal.flush().expect("flush");

    let entries = wal.entries_after(1).expect("entries_after");
    let seqs: Vec<u64> = entries.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![2]);
}

#[test]
fn truncate_before_drops_older_entries() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path).expect("open");
    wal.append(&sample_event(1)).expect("append");
    wal.append(&sample_event(2)).expect("append");
    wal.append(&sample_event(3)).expect("append");
    wal.flush().expect("flush");

    wal.truncate_before(2).expect("truncate");

    let remaining = wal.entries_after(0).expect("entries_after");
    let seqs: Vec<u64> = remaining.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![2, 3]);
}

#[test]
fn corrupt_tail_is_rotated_to_bak_and_valid_entries_preserved() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("wal.jsonl");
    {
        let mut wal = Wal::open(&path).expect("open");
        wal.append(&sample_event(1)).expect("append");
        wal.flush().expect("flush");
    }
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).expect("open for append");
    use std::io::Write as _;
    file.write_all(b"not json\n").expect("write garbage");

    let wal = Wal::open(&path).expect("reopen despite corruption");
    assert_eq!(wal.write_seq(), 1);
    assert!(path.with_extension("bak").exists());
}
