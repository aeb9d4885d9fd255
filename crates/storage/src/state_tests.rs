// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use strmsync_core::{ErrorKind, JobId, Priority, TaskFileCounts, TaskRun, TaskRunId, WorkerId};

fn pending_task(id: &str, dedup_key: Option<&str>, available_at: u64) -> TaskRun {
    let mut task = TaskRun::new_pending(TaskRunId::new(id), JobId::new("job-1"), available_at);
    task.available_at = available_at;
    task.dedup_key = dedup_key.map(|s| s.to_string());
    task
}

#[test]
fn enqueue_indexes_dedup_key() {
    let mut state = MaterializedState::default();
    let task = pending_task("t1", Some("job-1:daily"), 1_000);
    state.apply(&StorageEvent::task_enqueued(task.clone()));

    assert_eq!(state.tasks.len(), 1);
    assert_eq!(
        state.dedup_index.get("job-1:daily"),
        Some(&TaskRunId::new("t1"))
    );
}

#[test]
fn claim_transitions_to_running_and_sets_worker() {
    let mut state = MaterializedState::default();
    state.apply(&StorageEvent::task_enqueued(pending_task("t1", None, 0)));
    state.apply(&StorageEvent::TaskClaimed {
        id: TaskRunId::new("t1"),
        worker_id: WorkerId::new("w1"),
        started_at: 500,
        attempts: 1,
    });

    let task = &state.tasks[&TaskRunId::new("t1")];
    assert_eq!(task.status, strmsync_core::TaskStatus::Running);
    assert_eq!(task.worker_id, Some(WorkerId::new("w1")));
    assert_eq!(task.started_at, Some(500));
}

#[test]
fn completed_clears_dedup_index() {
    let mut state = MaterializedState::default();
    state.apply(&StorageEvent::task_enqueued(pending_task(
        "t1",
        Some("key"),
        0,
    )));
    state.apply(&StorageEvent::TaskCompleted {
        id: TaskRunId::new("t1"),
        ended_at: 1_000,
        duration_secs: 1,
        files: TaskFileCounts::default(),
    });

    assert!(state.dedup_index.is_empty());
    assert_eq!(
        state.tasks[&TaskRunId::new("t1")].status,
        strmsync_core::TaskStatus::Completed
    );
}

#[test]
fn retryable_failure_returns_to_pending_with_backoff() {
    let mut state = MaterializedState::default();
    state.apply(&StorageEvent::task_enqueued(pending_task("t1", None, 0)));
    state.apply(&StorageEvent::TaskFailed {
        id: TaskRunId::new("t1"),
        ended_at: 1_000,
        error_message: "timeout".to_string(),
        error_kind: ErrorKind::Retryable,
        next_available_at: Some(11_000),
    });

    let task = &state.tasks[&TaskRunId::new("t1")];
    assert_eq!(task.status, strmsync_core::TaskStatus::Pending);
    assert_eq!(task.available_at, 11_000);
}

#[test]
fn exhausted_failure_is_terminal_and_clears_dedup() {
    let mut state = MaterializedState::default();
    state.apply(&StorageEvent::task_enqueued(pending_task(
        "t1",
        Some("key"),
        0,
    )));
    state.apply(&StorageEvent::TaskFailed {
        id: TaskRunId::new("t1"),
        ended_at: 1_000,
        error_message: "bad config".to_string(),
        error_kind: ErrorKind::Permanent,
        next_available_at: None,
    });

    assert_eq!(
        state.tasks[&TaskRunId::new("t1")].status,
        strmsync_core::TaskStatus::Failed
    );
    assert!(state.dedup_index.is_empty());
}

#[test]
fn claimable_orders_by_priority_then_available_at() {
    let mut state = MaterializedState::default();
    let mut low = pending_task("low", None, 100);
    low.priority = Priority::Low;
    let mut high = pending_task("high", None, 200);
    high.priority = Priority::High;
    let normal = pending_task("normal", None, 50);

    state.apply(&StorageEvent::task_enqueued(low));
    state.apply(&StorageEvent::task_enqueued(high));
    state.apply(&StorageEvent::task_enqueued(normal));

    let order: Vec<&str> = state
        .claimable(1_000)
        .into_iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(order, vec!["high", "normal", "low"]);
}

#[test]
fn claimable_excludes_not_yet_available_tasks() {
    let mut state = MaterializedState::default();
    state.apply(&StorageEvent::task_enqueued(pending_task("future", None, 5_000)));
    assert!(state.claimable(1_000).is_empty());
    assert_eq!(state.claimable(5_000).len(), 1);
}

#[test]
fn stale_running_reports_tasks_past_threshold() {
    let mut state = MaterializedState::default();
    state.apply(&StorageEvent::task_enqueued(pending_task("t1", None, 0)));
    state.apply(&StorageEvent::TaskClaimed {
        id: TaskRunId::new("t1"),
        worker_id: WorkerId::new("w1"),
        started_at: 0,
        attempts: 1,
    });

    assert!(state.stale_running(100_000, 900).is_empty());
    assert_eq!(state.stale_running(1_000_000, 900), vec![TaskRunId::new("t1")]);
}

#[test]
fn run_event_log_is_bounded() {
    let mut state = MaterializedState::default();
    for i in 0..(super::MAX_RETAINED_RUN_EVENTS + 10) {
        state.apply(&StorageEvent::RunEventAppended {
            event: strmsync_core::RunEvent {
                run_id: TaskRunId::new("t1"),
                op: strmsync_core::RunEventOp::Create,
                status: strmsync_core::RunEventStatus::Success,
                source_path: format!("file-{i}"),
                target_path: format!("file-{i}.strm"),
                error_message: None,
                timestamp_ms: i as u64,
            },
        });
    }
    assert_eq!(state.run_events.len(), super::MAX_RETAINED_RUN_EVENTS);
    assert_eq!(state.run_events.first().unwrap().source_path, "file-10");
}
