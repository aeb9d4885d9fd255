// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use strmsync_core::{SequentialIdGen, TaskFileCounts};
use tempfile::tempdir;

fn open_queue(dir: &std::path::Path) -> Queue<SequentialIdGen> {
    Queue::open(dir.to_path_buf(), SequentialIdGen::new("task")).expect("open queue")
}

#[test]
fn enqueue_then_claim_transitions_to_running() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());

    let id = queue
        .enqueue(JobId::new("job-1"), 1_000, EnqueueOptions::default())
        .expect("enqueue");
    let claimed = queue
        .claim_next(WorkerId::new("w1"), 1_000)
        .expect("claim")
        .expect("some task");

    assert_eq!(claimed.id, id);
    assert_eq!(claimed.status, TaskStatus::Running);
    assert_eq!(claimed.attempts, 1);
}

#[test]
fn claim_next_returns_none_when_queue_is_empty() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    assert!(queue.claim_next(WorkerId::new("w1"), 1_000).expect("claim").is_none());
}

#[test]
fn duplicate_dedup_key_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    let opts = EnqueueOptions {
        dedup_key: Some("job-1:daily".to_string()),
        ..Default::default()
    };

    let first = queue
        .enqueue(JobId::new("job-1"), 1_000, opts.clone())
        .expect("enqueue");
    let err = queue
        .enqueue(JobId::new("job-1"), 2_000, opts)
        .expect_err("duplicate should be rejected");

    assert!(matches!(err, QueueError::DuplicateTask(id) if id == first));
    assert_eq!(queue.list().len(), 1);
}

#[test]
fn dedup_key_is_reusable_once_the_holder_completes() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    let opts = EnqueueOptions {
        dedup_key: Some("job-1:daily".to_string()),
        ..Default::default()
    };

    let first = queue
        .enqueue(JobId::new("job-1"), 1_000, opts.clone())
        .expect("enqueue");
    queue.claim_next(WorkerId::new("w1"), 1_000).expect("claim");
    queue
        .complete(&first, 2_000, TaskFileCounts::default())
        .expect("complete");

    let second = queue
        .enqueue(JobId::new("job-1"), 3_000, opts)
        .expect("enqueue after completion");
    assert_ne!(first, second);
}

#[test]
fn claim_next_rejects_empty_worker_id() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    queue
        .enqueue(JobId::new("job-1"), 1_000, EnqueueOptions::default())
        .expect("enqueue");

    let err = queue
        .claim_next(WorkerId::new(""), 1_000)
        .expect_err("empty worker id should be rejected");
    assert!(matches!(err, QueueError::MissingWorkerId));
}

#[test]
fn complete_marks_task_terminal() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    let id = queue
        .enqueue(JobId::new("job-1"), 1_000, EnqueueOptions::default())
        .expect("enqueue");
    queue.claim_next(WorkerId::new("w1"), 1_000).expect("claim");

    queue
        .complete(&id, 2_000, TaskFileCounts::default())
        .expect("complete");

    let task = queue.get(&id).expect("task");
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.duration_secs, Some(1));
}

#[test]
fn retryable_failure_is_requeued_with_backoff() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    let id = queue
        .enqueue(JobId::new("job-1"), 1_000, EnqueueOptions::default())
        .expect("enqueue");
    queue.claim_next(WorkerId::new("w1"), 1_000).expect("claim");

    queue
        .fail(&id, 1_000, "network blip", ErrorKind::Retryable)
        .expect("fail");

    let task = queue.get(&id).expect("task");
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.available_at, 1_000 + backoff_secs(1) * 1000);
}

#[test]
fn permanent_failure_is_terminal() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    let id = queue
        .enqueue(JobId::new("job-1"), 1_000, EnqueueOptions::default())
        .expect("enqueue");
    queue.claim_next(WorkerId::new("w1"), 1_000).expect("claim");

    queue
        .fail(&id, 1_000, "bad config", ErrorKind::Permanent)
        .expect("fail");

    assert_eq!(queue.get(&id).expect("task").status, TaskStatus::Failed);
}

#[test]
fn exhausted_retries_become_terminal_even_if_retryable() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    let opts = EnqueueOptions {
        max_attempts: 1,
        ..Default::default()
    };
    let id = queue.enqueue(JobId::new("job-1"), 0, opts).expect("enqueue");
    queue.claim_next(WorkerId::new("w1"), 0).expect("claim");

    queue
        .fail(&id, 0, "timeout", ErrorKind::Retryable)
        .expect("fail");

    assert_eq!(queue.get(&id).expect("task").status, TaskStatus::Failed);
}

#[test]
fn cancel_pending_task() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    let id = queue
        .enqueue(JobId::new("job-1"), 0, EnqueueOptions::default())
        .expect("enqueue");
    queue.cancel(&id, 10).expect("cancel");
    assert_eq!(queue.get(&id).expect("task").status, TaskStatus::Cancelled);
}

#[test]
fn recover_stale_requeues_long_running_tasks() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    let id = queue
        .enqueue(JobId::new("job-1"), 0, EnqueueOptions::default())
        .expect("enqueue");
    queue.claim_next(WorkerId::new("w1"), 0).expect("claim");

    let recovered = queue.recover_stale(20 * 60 * 1000, 15 * 60).expect("recover");
    assert_eq!(recovered, 1);
    assert_eq!(queue.get(&id).expect("task").status, TaskStatus::Pending);
}

#[test]
fn recover_stale_ignores_recent_running_tasks() {
    let dir = tempdir().expect("tempdir");
    let queue = open_queue(dir.path());
    queue
        .enqueue(JobId::new("job-1"), 0, EnqueueOptions::default())
        .expect("enqueue");
    queue.claim_next(WorkerId::new("w1"), 0).expect("claim");

    let recovered = queue.recover_stale(60_000, 15 * 60).expect("recover");
    assert_eq!(recovered, 0);
}

#[test]
fn state_survives_reopen_via_wal_replay() {
    let dir = tempdir().expect("tempdir");
    let id = {
        let queue = open_queue(dir.path());
        queue
            .enqueue(JobId::new("job-1"), 0, EnqueueOptions::default())
            .expect("enqueue")
    };

    let reopened = open_queue(dir.path());
    let task = reopened.get(&id).expect("task survives reopen");
    assert_eq!(task.status, TaskStatus::Pending);
}

#[test]
fn checkpoint_truncates_wal_without_losing_state() {
    let dir = tempdir().expect("tempdir");
    let id = {
        let queue = open_queue(dir.path());
        let id = queue
            .enqueue(JobId::new("job-1"), 0, EnqueueOptions::default())
            .expect("enqueue");
        queue.checkpoint().expect("checkpoint");
        id
    };

    let reopened = open_queue(dir.path());
    assert_eq!(reopened.get(&id).expect("task").status, TaskStatus::Pending);
}

#[test]
fn backoff_schedule_is_capped_at_five_minutes() {
    assert_eq!(backoff_secs(1), 10);
    assert_eq!(backoff_secs(5), 50);
    assert_eq!(backoff_secs(100), 300);
}
