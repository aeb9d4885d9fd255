// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed `JobRepository`/`DataServerRepository` (§4.G). Loaded once
//! at process start; `GetByID`/`ListEnabled` serve from an in-memory map
//! built at load time.

use crate::dto::RawConfig;
use crate::error::ConfigError;
use crate::settings::{EngineSettings, QueueSettings};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use strmsync_core::{
    DataServer, DataServerId, DataServerRepository, Job, JobId, JobRepository, RepoError,
};

/// Everything parsed from a single TOML file: data servers, jobs, and
/// global tunables (§6).
pub struct FileConfig {
    pub jobs: FileJobRepository,
    pub data_servers: FileDataServerRepository,
    pub engine: EngineSettings,
    pub queue: QueueSettings,
}

impl FileConfig {
    /// Parse and validate `path`, cross-checking every job's
    /// `data_server_id` against the loaded servers (§3 invariant:
    /// "`data_server_id` required when source is remote").
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&text, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            jobs = config.jobs.jobs.len(),
            servers = config.data_servers.servers.len(),
            "loaded config"
        );
        Ok(config)
    }

    fn parse(text: &str, path_label: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path_label.to_string(),
            source: Box::new(source),
        })?;

        let mut servers = HashMap::new();
        for raw_server in raw.data_servers {
            let server: DataServer = raw_server.try_into()?;
            servers.insert(server.id.clone(), server);
        }

        let mut jobs = HashMap::new();
        for raw_job in raw.jobs {
            let job: Job = raw_job.try_into()?;
            if let Some(server_id) = &job.data_server_id {
                if !servers.contains_key(server_id) {
                    return Err(ConfigError::UnknownDataServer(
                        job.name.clone(),
                        server_id.as_str().to_string(),
                    ));
                }
            }
            jobs.insert(job.id.clone(), job);
        }

        Ok(Self {
            jobs: FileJobRepository {
                jobs: Arc::new(jobs),
            },
            data_servers: FileDataServerRepository {
                servers: Arc::new(servers),
            },
            engine: raw.engine.into(),
            queue: raw.queue.into(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileJobRepository {
    jobs: Arc<HashMap<JobId, Job>>,
}

#[async_trait]
impl JobRepository for FileJobRepository {
    async fn get_by_id(&self, id: &JobId) -> Result<Job, RepoError> {
        self.jobs
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    async fn list_enabled(&self) -> Result<Vec<Job>, RepoError> {
        Ok(self.jobs.values().filter(|j| j.enabled).cloned().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileDataServerRepository {
    servers: Arc<HashMap<DataServerId, DataServer>>,
}

#[async_trait]
impl DataServerRepository for FileDataServerRepository {
    async fn get_by_id(&self, id: &DataServerId) -> Result<DataServer, RepoError> {
        self.servers
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
