// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `strmsync run-once` — drive a single job's sync in the foreground,
//! bypassing the queue (useful for manual runs and debugging).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use strmsync_adapters::StrmWriter;
use strmsync_config::FileConfig;
use strmsync_core::{
    DataServerRepository, IdGen, JobId, JobRepository, NullEventSink, SystemClock, TaskRunId,
    UuidIdGen,
};
use strmsync_engine::{DefaultDriverFactory, DriverFactory, SyncEngine};

#[derive(Args)]
pub struct RunOnceArgs {
    /// Job ID as defined in the config file
    pub job_id: String,
}

pub async fn handle(args: RunOnceArgs, config_path: &Path) -> Result<()> {
    let config = FileConfig::load(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let job_id = JobId::new(args.job_id);
    let job = config
        .jobs
        .get_by_id(&job_id)
        .await
        .with_context(|| format!("job '{job_id}' not found in config"))?;

    let server_id = job
        .data_server_id
        .clone()
        .context("job has no data_server_id configured")?;
    let server = config
        .data_servers
        .get_by_id(&server_id)
        .await
        .with_context(|| format!("data server '{server_id}' not found in config"))?;

    let driver = DefaultDriverFactory.build(&server)?;
    let writer = Arc::new(StrmWriter::new(PathBuf::from(&job.target_root)));
    let engine = SyncEngine::new(driver, writer, Arc::new(NullEventSink), SystemClock);

    let run_id = TaskRunId::new(UuidIdGen.next());
    let token = CancellationToken::new();
    let stats = engine
        .run_once(run_id, server.id.as_str(), &job, token)
        .await?;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
