// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the worker pool boundary (§7).

use strmsync_adapters::{DriverError, WriterError};
use strmsync_core::ErrorKind;
use strmsync_storage::QueueError;
use thiserror::Error;

use crate::sync::{SyncError, SyncErrorKind};

/// Errors that can occur while a worker pool drives a single task (§7).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
    #[error("writer error: {0}")]
    Writer(#[from] WriterError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("job disabled: {0}")]
    JobDisabled(String),
    #[error("data server not found: {0}")]
    DataServerNotFound(String),
    #[error("unsupported data server kind: {0}")]
    UnsupportedDataServerKind(String),
    #[error("task exceeded its hard timeout of {0:?}")]
    TaskTimedOut(std::time::Duration),
}

impl RuntimeError {
    /// Classify per the queue's failure-classification rule (§4.D, §7): an
    /// explicit typed wrapper always wins over heuristics.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Driver(e) => e.kind(),
            RuntimeError::Sync(e) => match &e.source {
                SyncErrorKind::Cancelled => ErrorKind::Cancelled,
                SyncErrorKind::ScanFailed(driver_err) => driver_err.kind(),
                SyncErrorKind::AlreadyRunning => ErrorKind::Permanent,
            },
            RuntimeError::TaskTimedOut(_) => ErrorKind::Retryable,
            RuntimeError::Writer(_)
            | RuntimeError::Queue(_)
            | RuntimeError::JobNotFound(_)
            | RuntimeError::JobDisabled(_)
            | RuntimeError::DataServerNotFound(_)
            | RuntimeError::UnsupportedDataServerKind(_) => ErrorKind::Permanent,
        }
    }
}
