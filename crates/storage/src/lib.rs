// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! strmsync-storage: the durable task queue's WAL, snapshot, and
//! checkpoint machinery (§4.D).

mod checkpoint;
mod event;
mod queue;
mod sink;
mod snapshot;
mod state;
mod wal;

pub use checkpoint::{CheckpointError, CheckpointHandle, CheckpointResult, Checkpointer};
pub use event::StorageEvent;
pub use queue::{EnqueueOptions, Queue, QueueError};
pub use sink::QueueEventSink;
pub use snapshot::{Snapshot, SnapshotError};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry, WalError};

/// Current snapshot schema version. There is only one version so far;
/// bumping this is the point at which [`load_snapshot`](checkpoint::load_snapshot)
/// would need an upgrade path for older files.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

fn default_snapshot_version() -> u32 {
    CURRENT_SNAPSHOT_VERSION
}
