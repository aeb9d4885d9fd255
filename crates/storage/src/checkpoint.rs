// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background checkpointing of [`MaterializedState`] to a zstd-compressed
//! snapshot file (§4.D).
//!
//! `Checkpointer::start` clones the state and hands it to a background
//! thread that serializes, compresses, and durably writes it: write to a
//! `.tmp` file, fsync the file, rename into place, then fsync the parent
//! directory so the rename itself survives a crash. `Queue::checkpoint`
//! waits on the returned handle before truncating the WAL — the snapshot
//! must be durable first, or a crash between truncation and a completed
//! write would lose the tail it was meant to replace.

use crate::{MaterializedState, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compress(String),
    #[error("checkpoint failed: {0}")]
    Failed(String),
}

/// Result of a completed checkpoint.
#[derive(Debug, Clone)]
pub struct CheckpointResult {
    pub seq: u64,
    pub size_bytes: u64,
}

/// Handle to a checkpoint running on a background thread.
pub struct CheckpointHandle {
    pub seq: u64,
    receiver: mpsc::Receiver<Result<CheckpointResult, CheckpointError>>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl CheckpointHandle {
    /// Block until the snapshot is fully durable. Only after this returns
    /// successfully is it safe to truncate the WAL.
    pub fn wait(self) -> Result<CheckpointResult, CheckpointError> {
        self.receiver
            .recv()
            .map_err(|_| CheckpointError::Failed("checkpoint thread panicked".into()))?
    }
}

/// Runs the queue's snapshot checkpoints (§4.D). One checkpoint at a time:
/// `Queue::checkpoint` holds the queue lock for the snapshot clone and
/// waits on the handle before starting another.
pub struct Checkpointer {
    snapshot_path: PathBuf,
    compression_level: i32,
}

impl Checkpointer {
    pub fn new(snapshot_path: PathBuf) -> Self {
        Self {
            snapshot_path,
            // zstd level 3 is a good balance of speed and compression
            compression_level: 3,
        }
    }

    /// Clone `state` and spawn a thread to serialize, compress, and write
    /// the snapshot. The returned handle must be waited on before
    /// truncating the WAL.
    pub fn start(&self, seq: u64, state: &MaterializedState) -> CheckpointHandle {
        let state_clone = state.clone();
        let snapshot_path = self.snapshot_path.clone();
        let compression_level = self.compression_level;

        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let result = write_snapshot(seq, &state_clone, &snapshot_path, compression_level);
            let _ = tx.send(result);
        });

        CheckpointHandle { seq, receiver: rx, handle }
    }
}

fn write_snapshot(
    seq: u64,
    state: &MaterializedState,
    snapshot_path: &Path,
    compression_level: i32,
) -> Result<CheckpointResult, CheckpointError> {
    if let Some(parent) = snapshot_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = snapshot_path.with_extension("tmp");

    let snapshot = Snapshot {
        version: CURRENT_SNAPSHOT_VERSION,
        seq,
        state: state.clone(),
        created_at: Utc::now(),
    };
    let json_bytes = serde_json::to_vec(&snapshot)?;
    let compressed = zstd::encode_all(json_bytes.as_slice(), compression_level)
        .map_err(|e| CheckpointError::Compress(e.to_string()))?;

    let mut file = File::create(&tmp_path)?;
    file.write_all(&compressed)?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, snapshot_path)?;
    if let Some(parent) = snapshot_path.parent() {
        File::open(parent)?.sync_all()?;
    }

    let size_bytes = std::fs::metadata(snapshot_path)
        .map(|m| m.len())
        .unwrap_or(compressed.len() as u64);
    Ok(CheckpointResult { seq, size_bytes })
}

/// Load and decompress a snapshot written by [`Checkpointer`], if present.
/// A snapshot that fails to decode is rotated to `.bak` the same way
/// [`crate::wal`] handles a corrupt tail, so the daemon falls back to a
/// full WAL replay instead of failing to start.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }

    let decoded: Result<Snapshot, SnapshotError> = (|| {
        let file = File::open(path)?;
        let decoder = zstd::stream::read::Decoder::new(file)
            .map_err(|e| SnapshotError::Io(std::io::Error::other(e.to_string())))?;
        Ok(serde_json::from_reader(decoder)?)
    })();

    match decoded {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(e) => {
            let bak_path = crate::snapshot::rotate_bak_path(path);
            tracing::warn!(
                error = %e,
                path = %path.display(),
                bak = %bak_path.display(),
                "corrupt snapshot, moving to .bak and starting fresh",
            );
            std::fs::rename(path, &bak_path)?;
            Ok(None)
        }
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
