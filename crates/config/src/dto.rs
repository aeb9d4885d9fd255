// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML-shaped raw structures, converted into `strmsync_core` domain types
//! at load time via a parse-then-lower pass.

use crate::error::ConfigError;
use crate::settings::{EngineSettings, QueueSettings};
use serde::Deserialize;
use std::time::Duration;
use strmsync_core::{
    DataServer, DataServerId, DataServerKind, Job, JobId, JobOptions, MetadataMode, ReplaceRule,
    StrmMode,
};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawConfig {
    pub engine: RawEngineSettings,
    pub queue: RawQueueSettings,
    #[serde(rename = "data_server")]
    pub data_servers: Vec<RawDataServer>,
    #[serde(rename = "job")]
    pub jobs: Vec<RawJob>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RawEngineSettings {
    pub max_concurrency: i64,
    pub mod_time_epsilon_secs: i64,
    pub recovery_stale_after_secs: u64,
}

impl Default for RawEngineSettings {
    fn default() -> Self {
        let defaults = EngineSettings::default();
        Self {
            max_concurrency: defaults.max_concurrency,
            mod_time_epsilon_secs: defaults.mod_time_epsilon_secs,
            recovery_stale_after_secs: defaults.recovery_stale_after_secs,
        }
    }
}

impl From<RawEngineSettings> for EngineSettings {
    fn from(raw: RawEngineSettings) -> Self {
        Self {
            max_concurrency: raw.max_concurrency,
            mod_time_epsilon_secs: raw.mod_time_epsilon_secs,
            recovery_stale_after_secs: raw.recovery_stale_after_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RawQueueSettings {
    pub data_dir: String,
    pub worker_count: usize,
    pub poll_interval_secs: u64,
    pub task_timeout_secs: Option<u64>,
}

impl Default for RawQueueSettings {
    fn default() -> Self {
        let defaults = QueueSettings::default();
        Self {
            data_dir: defaults.data_dir,
            worker_count: defaults.worker_count,
            poll_interval_secs: defaults.poll_interval_secs,
            task_timeout_secs: defaults.task_timeout_secs,
        }
    }
}

impl From<RawQueueSettings> for QueueSettings {
    fn from(raw: RawQueueSettings) -> Self {
        Self {
            data_dir: raw.data_dir,
            worker_count: raw.worker_count,
            poll_interval_secs: raw.poll_interval_secs,
            task_timeout_secs: raw.task_timeout_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawDataServer {
    pub id: String,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    pub credential: Option<String>,
    pub mount_path: Option<String>,
    pub access_path: Option<String>,
    #[serde(default)]
    pub use_tls: bool,
    pub rate_limit_per_sec: Option<u32>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl TryFrom<RawDataServer> for DataServer {
    type Error = ConfigError;

    fn try_from(raw: RawDataServer) -> Result<Self, ConfigError> {
        let kind = match raw.kind.as_str() {
            "local" => DataServerKind::Local,
            "clouddrive2" => DataServerKind::Clouddrive2,
            "openlist" => DataServerKind::Openlist,
            other => {
                return Err(ConfigError::InvalidJob {
                    name: raw.name.clone(),
                    reason: format!("unknown data server kind '{other}'"),
                })
            }
        };
        Ok(DataServer {
            id: DataServerId::new(raw.id),
            name: raw.name,
            kind,
            host: raw.host,
            port: raw.port,
            credential: raw.credential,
            mount_path: raw.mount_path,
            access_path: raw.access_path,
            use_tls: raw.use_tls,
            rate_limit_per_sec: raw.rate_limit_per_sec,
            max_retries: raw.max_retries,
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawJob {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub cron: Option<String>,
    pub data_server_id: Option<String>,
    pub media_server_id: Option<String>,
    pub source_root: String,
    pub target_root: String,
    #[serde(default)]
    pub options: RawJobOptions,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawJobOptions {
    pub recursive: Option<bool>,
    pub max_depth: Option<u32>,
    pub extensions: Vec<String>,
    pub min_file_size: u64,
    pub exclude_dirs: Vec<String>,
    pub strm_mode: Option<String>,
    pub metadata_mode: Option<String>,
    pub strm_replace_rules: Vec<RawReplaceRule>,
    pub mount_mapping: Option<RawReplaceRule>,
    pub max_concurrency: Option<i64>,
    pub mod_time_epsilon_secs: Option<i64>,
    pub orphan_cleanup: bool,
    pub dry_run: bool,
    pub force_update: bool,
    pub skip_existing: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawReplaceRule {
    pub from: String,
    pub to: String,
}

impl From<RawReplaceRule> for ReplaceRule {
    fn from(raw: RawReplaceRule) -> Self {
        ReplaceRule {
            from: raw.from,
            to: raw.to,
        }
    }
}

impl From<RawJobOptions> for JobOptions {
    fn from(raw: RawJobOptions) -> Self {
        let defaults = JobOptions::default();
        JobOptions {
            recursive: raw.recursive.unwrap_or(defaults.recursive),
            max_depth: raw.max_depth.unwrap_or(defaults.max_depth),
            extensions: raw.extensions,
            min_file_size: raw.min_file_size,
            exclude_dirs: raw.exclude_dirs,
            strm_mode: match raw.strm_mode.as_deref() {
                Some("local") => StrmMode::Local,
                Some("url") | None => StrmMode::Url,
                Some(_) => defaults.strm_mode,
            },
            metadata_mode: match raw.metadata_mode.as_deref() {
                Some("copy") => MetadataMode::Copy,
                Some("download") => MetadataMode::Download,
                Some("none") | None => MetadataMode::None,
                Some(_) => defaults.metadata_mode,
            },
            strm_replace_rules: raw.strm_replace_rules.into_iter().map(Into::into).collect(),
            mount_mapping: raw.mount_mapping.map(Into::into),
            max_concurrency: raw.max_concurrency.unwrap_or(defaults.max_concurrency),
            mod_time_epsilon_secs: raw
                .mod_time_epsilon_secs
                .unwrap_or(defaults.mod_time_epsilon_secs),
            orphan_cleanup: raw.orphan_cleanup,
            dry_run: raw.dry_run,
            force_update: raw.force_update,
            skip_existing: raw.skip_existing,
        }
    }
}

impl TryFrom<RawJob> for Job {
    type Error = ConfigError;

    fn try_from(raw: RawJob) -> Result<Self, ConfigError> {
        let job = Job {
            id: JobId::new(raw.id),
            name: raw.name.clone(),
            enabled: raw.enabled,
            cron: raw.cron,
            data_server_id: raw.data_server_id.map(DataServerId::new),
            media_server_id: raw.media_server_id,
            source_root: raw.source_root,
            target_root: raw.target_root,
            options: raw.options.into(),
        };
        job.validate().map_err(|reason| ConfigError::InvalidJob {
            name: raw.name,
            reason,
        })?;
        Ok(job)
    }
}

#[cfg(test)]
#[path = "dto_tests.rs"]
mod tests;
