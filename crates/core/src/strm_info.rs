// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! StrmInfo: a structured computed artifact built by a driver (§3, §4.A).

use serde::{Deserialize, Serialize};

/// `raw_url` is the exact bytes a driver wants written to the `.strm` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrmInfo {
    pub raw_url: String,
    pub base_url: Option<String>,
    pub path: String,
    /// Epoch milliseconds the URL/signature expires at, if any.
    pub expires_at_ms: Option<u64>,
}

impl StrmInfo {
    pub fn new(raw_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            raw_url: raw_url.into(),
            base_url: None,
            path: path.into(),
            expires_at_ms: None,
        }
    }
}

/// Why a [`StrmComparison`] found a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMismatch {
    BaseUrl,
    Path,
    Sign,
    Expiry,
}

/// Outcome of comparing an expected [`StrmInfo`] against the raw bytes found
/// on disk (§4.A `CompareStrm`). Exposed on the `Driver` trait but never
/// consulted by the sync engine's own `DecideUpdate` pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrmComparison {
    pub equal: bool,
    pub need_update: bool,
    pub reason: Option<CompareMismatch>,
}
