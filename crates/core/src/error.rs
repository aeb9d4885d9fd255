// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy (§7).
//!
//! `CoreError` is the common vocabulary every crate's own error type wraps
//! or converts into at its boundary. `ErrorKind` is the classification the
//! task queue uses to decide whether a failure is retried, exhausted, or
//! dropped as a cancellation.

use thiserror::Error;

/// Classification used by the queue to decide retry behavior (§4.D, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transient network/DNS/IO error; the queue reschedules with backoff.
    Retryable,
    /// Misconfiguration or persistent failure; retries are exhausted immediately.
    Permanent,
    /// Context cancellation; never retried, not counted as a failure.
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Retryable => write!(f, "retryable"),
            ErrorKind::Permanent => write!(f, "permanent"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Errors shared across the driver/writer/engine boundary (§7).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("path escapes root: {0}")]
    PathEscape(String),

    #[error("retryable error: {0}")]
    Retryable(String),

    #[error("permanent error: {0}")]
    Permanent(String),

    #[error("cancelled")]
    Cancelled,
}

impl CoreError {
    /// Classify this error per the queue's failure-classification rule (§4.D):
    /// an explicit wrapper always wins over heuristics.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Cancelled => ErrorKind::Cancelled,
            CoreError::Retryable(_) => ErrorKind::Retryable,
            CoreError::InvalidInput(_)
            | CoreError::NotSupported(_)
            | CoreError::NotFound(_)
            | CoreError::PathEscape(_)
            | CoreError::Permanent(_) => ErrorKind::Permanent,
        }
    }
}
