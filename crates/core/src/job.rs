// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job: a user-defined synchronisation unit (§3).

use crate::server::DataServerId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a job.
    #[derive(Default)]
    pub struct JobId;
}

/// `strm_mode` controls whether `.strm` files hold a local mount path or a
/// remote HTTP(S) URL (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrmMode {
    Local,
    Url,
}

impl Default for StrmMode {
    fn default() -> Self {
        StrmMode::Url
    }
}

/// `metadata_mode` controls ancillary (non-media) file handling alongside `.strm` stubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataMode {
    Copy,
    Download,
    None,
}

impl Default for MetadataMode {
    fn default() -> Self {
        MetadataMode::None
    }
}

/// A single ordered prefix-substitution rule applied to either the remote
/// path (strm_replace_rules) or a raw STRM URL (mount_mapping is a single
/// instance of this shape, per §4.C step 3b).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceRule {
    pub from: String,
    pub to: String,
}

impl ReplaceRule {
    /// Apply the rule once, substituting a leading-prefix match.
    pub fn apply(&self, input: &str) -> String {
        if let Some(rest) = input.strip_prefix(self.from.as_str()) {
            format!("{}{}", self.to, rest)
        } else {
            input.to_string()
        }
    }
}

/// Free-form per-job options (§3, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    /// Whether to recurse into subdirectories during scan.
    pub recursive: bool,
    /// Maximum scan depth (§4.C step 1 default is 25 when unset).
    pub max_depth: u32,
    /// Lowercase, case-insensitive extension whitelist (e.g. `[".mp4"]`). Empty = accept all.
    pub extensions: Vec<String>,
    /// Files smaller than this (in bytes) are filtered out. 0 disables the filter.
    pub min_file_size: u64,
    /// Remote-root-relative directory prefixes to exclude from the scan.
    pub exclude_dirs: Vec<String>,
    pub strm_mode: StrmMode,
    pub metadata_mode: MetadataMode,
    /// Ordered prefix-substitution rules applied to the raw STRM content (§4.C step 3b).
    pub strm_replace_rules: Vec<ReplaceRule>,
    /// A single `from -> to` prefix substitution applied before `strm_replace_rules`.
    pub mount_mapping: Option<ReplaceRule>,
    /// Per-run file-level parallelism; <= 0 coerces to the default of 10 (§6, §8).
    pub max_concurrency: i64,
    /// mtime equality tolerance in seconds; <= 0 coerces to the default of 2 (§6, §8).
    pub mod_time_epsilon_secs: i64,
    pub orphan_cleanup: bool,
    pub dry_run: bool,
    pub force_update: bool,
    pub skip_existing: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 25,
            extensions: Vec::new(),
            min_file_size: 0,
            exclude_dirs: Vec::new(),
            strm_mode: StrmMode::default(),
            metadata_mode: MetadataMode::default(),
            strm_replace_rules: Vec::new(),
            mount_mapping: None,
            max_concurrency: 10,
            mod_time_epsilon_secs: 2,
            orphan_cleanup: false,
            dry_run: false,
            force_update: false,
            skip_existing: false,
        }
    }
}

impl JobOptions {
    /// `max_concurrency` coerced to its default when non-positive (§8 boundary behaviour).
    pub fn effective_max_concurrency(&self) -> usize {
        if self.max_concurrency <= 0 {
            10
        } else {
            self.max_concurrency as usize
        }
    }

    /// `mod_time_epsilon` coerced to its default when non-positive (§8 boundary behaviour).
    pub fn effective_mod_time_epsilon_secs(&self) -> i64 {
        if self.mod_time_epsilon_secs <= 0 {
            2
        } else {
            self.mod_time_epsilon_secs
        }
    }

    /// Whether a filename's extension (case-insensitive) passes the whitelist.
    /// An empty whitelist accepts everything (§8 boundary behaviour).
    pub fn accepts_extension(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let lower = name.to_ascii_lowercase();
        self.extensions
            .iter()
            .any(|ext| lower.ends_with(ext.to_ascii_lowercase().as_str()))
    }
}

/// A user-defined synchronisation unit (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub enabled: bool,
    /// Cron expression; scheduler owns triggers only when `enabled && cron.is_some()`.
    pub cron: Option<String>,
    pub data_server_id: Option<DataServerId>,
    pub media_server_id: Option<String>,
    /// Remote path scanned by the sync engine.
    pub source_root: String,
    /// Local directory the `.strm` tree is written under.
    pub target_root: String,
    pub options: JobOptions,
}

impl Job {
    /// Whether the scheduler should own cron triggers for this job (§3 invariant).
    pub fn is_cron_managed(&self) -> bool {
        self.enabled && self.cron.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Whether this job's config is internally consistent (§3 invariants).
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("job name must not be empty".to_string());
        }
        if self.target_root.trim().is_empty() {
            return Err("target_root must not be empty".to_string());
        }
        if self.data_server_id.is_none() {
            return Err("data_server_id is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
