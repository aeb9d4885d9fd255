// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver abstraction (§4.A): uniform scan/stat/stream-URL-build/compare/
//! health-check over heterogeneous backends.

mod clouddrive2;
mod local;
mod openlist;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use clouddrive2::ClouddriveDriver;
pub use local::LocalDriver;
pub use openlist::OpenlistDriver;

use async_trait::async_trait;
use strmsync_core::{CompareMismatch, ErrorKind, RemoteEntry, StrmComparison, StrmInfo, StrmMode};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors returned by driver operations (§4.A, §7).
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("retryable: {0}")]
    Retryable(String),
    #[error("permanent: {0}")]
    Permanent(String),
    #[error("cancelled")]
    Cancelled,
}

impl DriverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::Cancelled => ErrorKind::Cancelled,
            DriverError::Retryable(_) => ErrorKind::Retryable,
            DriverError::InvalidInput(_)
            | DriverError::NotSupported(_)
            | DriverError::NotFound(_)
            | DriverError::Permanent(_) => ErrorKind::Permanent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverType {
    Local,
    Clouddrive2,
    Openlist,
}

impl std::fmt::Display for DriverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverType::Local => write!(f, "local"),
            DriverType::Clouddrive2 => write!(f, "clouddrive2"),
            DriverType::Openlist => write!(f, "openlist"),
        }
    }
}

/// Capability flags a driver declares statically (§4.A, glossary).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub watch: bool,
    pub strm_http: bool,
    pub strm_mount: bool,
    pub sign_url: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub recursive: bool,
    pub max_depth: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 25,
        }
    }
}

/// Parameters for [`Driver::build_strm_info`] (§4.A).
#[derive(Debug, Clone)]
pub struct BuildStrmInfoParams {
    pub server_id: String,
    pub remote_path: String,
    pub remote_meta: Option<RemoteEntry>,
    /// Job's `strm_mode` option (§3, §6): whether the caller wants the
    /// written `.strm` content to be a mount-resolved local path or an
    /// HTTP(S) URL. A driver that lacks the matching capability
    /// (`strm_mount`/`strm_http`) returns `ErrNotSupported`.
    pub strm_mode: StrmMode,
}

/// A paired lazy entry/error stream from a scan (§4.A, §9). The entries
/// channel closes before the errors channel; callers must drain both.
#[derive(Debug)]
pub struct ScanStream {
    pub entries: mpsc::Receiver<RemoteEntry>,
    pub errors: mpsc::Receiver<DriverError>,
}

/// Uniform backend abstraction (§4.A). Implementations must be safe for
/// concurrent use; any outbound API/download concurrency is gated by an
/// internal [`crate::rate_limit::RateLimiter`].
#[async_trait]
pub trait Driver: Send + Sync {
    fn driver_type(&self) -> DriverType;
    fn capabilities(&self) -> Capabilities;

    /// Start a scan under `root`; returns immediately with a paired lazy
    /// stream pair. The scan itself runs on a background task.
    async fn scan(&self, root: &str, opts: ScanOptions) -> Result<ScanStream, DriverError>;

    async fn stat(&self, path: &str) -> Result<RemoteEntry, DriverError>;

    async fn build_strm_info(&self, params: BuildStrmInfoParams) -> Result<StrmInfo, DriverError>;

    /// Whitespace-insensitive comparison against `actual_raw` (§4.A). Kept
    /// for capability-contract completeness; the sync engine itself never
    /// calls this to decide updates.
    fn compare_strm(&self, expected: &StrmInfo, actual_raw: &str) -> StrmComparison {
        let trimmed_actual = actual_raw.trim();
        let trimmed_expected = expected.raw_url.trim();
        if trimmed_actual == trimmed_expected {
            return StrmComparison {
                equal: true,
                need_update: false,
                reason: None,
            };
        }
        let reason = classify_mismatch(expected, trimmed_actual);
        StrmComparison {
            equal: false,
            need_update: true,
            reason: Some(reason),
        }
    }

    async fn test_connection(&self) -> Result<(), DriverError>;
}

fn classify_mismatch(expected: &StrmInfo, actual_raw: &str) -> CompareMismatch {
    if let (Some(base), Ok(actual_url)) = (&expected.base_url, url_parse_lite(actual_raw)) {
        if !actual_url.starts_with(base.as_str()) {
            return CompareMismatch::BaseUrl;
        }
    }
    if expected.expires_at_ms.is_some() && !actual_raw.contains("expire") {
        return CompareMismatch::Expiry;
    }
    if actual_raw.contains("sign=") != expected.raw_url.contains("sign=") {
        return CompareMismatch::Sign;
    }
    CompareMismatch::Path
}

/// Minimal scheme check so `classify_mismatch` can stay dependency-free.
fn url_parse_lite(raw: &str) -> Result<String, ()> {
    if raw.contains("://") {
        Ok(raw.to_string())
    } else {
        Err(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
