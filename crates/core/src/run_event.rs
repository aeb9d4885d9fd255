// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RunEvent: a per-file outcome emitted during a run (§3).

use crate::task_run::TaskRunId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEventOp {
    Create,
    Update,
    Delete,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEventStatus {
    Success,
    Failed,
    Skipped,
}

/// Append-only per-file outcome record (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub run_id: TaskRunId,
    pub op: RunEventOp,
    pub status: RunEventStatus,
    pub source_path: String,
    pub target_path: String,
    pub error_message: Option<String>,
    pub timestamp_ms: u64,
}
