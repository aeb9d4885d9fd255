// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RemoteEntry: a transient per-scan record (§3), and the RunIncremental
//! event payload it is synthesised from (§4.C).

use serde::{Deserialize, Serialize};

/// A single file or directory observed during a driver scan (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Unix-form absolute path within the driver's namespace.
    pub path: String,
    pub name: String,
    pub size: u64,
    /// UTC epoch milliseconds, truncated to 1s precision (§9).
    pub mod_time_ms: u64,
    pub is_dir: bool,
}

impl RemoteEntry {
    /// Truncate `mod_time_ms` to 1-second resolution, per the driver time-source note (§9).
    pub fn normalized_mod_time_ms(&self) -> u64 {
        (self.mod_time_ms / 1000) * 1000
    }
}

/// Kind of change carried by a RunIncremental event (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncrementalOp {
    Create,
    Update,
    Delete,
}

/// A single bounded event processed by RunIncremental (§4.C). Paths are
/// relative to the job's `source_root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncrementalEvent {
    pub op: IncrementalOp,
    pub path: String,
    /// Present for create/update; absent for delete.
    pub size: Option<u64>,
    pub mod_time_ms: Option<u64>,
}
