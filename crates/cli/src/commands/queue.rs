// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `strmsync queue` — inspect and manage the durable task queue directly,
//! without going through a running daemon.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use strmsync_config::FileConfig;
use strmsync_core::{Clock, JobId, Priority, SystemClock, TaskRunId, UuidIdGen};
use strmsync_storage::{EnqueueOptions, Queue};

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommand,
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// Enqueue a task for a job outside of its cron schedule
    Enqueue {
        /// Job ID as defined in the config file
        job_id: String,
        /// Dedup key; a pending/running task with the same key is reused
        #[arg(long)]
        dedup_key: Option<String>,
    },
    /// List all known tasks
    List {},
    /// Show a single task
    Show {
        /// Task run ID
        task_id: String,
    },
    /// Cancel a pending or running task
    Cancel {
        /// Task run ID
        task_id: String,
    },
}

pub async fn handle(args: QueueArgs, config_path: &Path) -> Result<()> {
    let config = FileConfig::load(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let queue = Queue::open(std::path::PathBuf::from(&config.queue.data_dir), UuidIdGen)
        .with_context(|| format!("opening queue at {}", config.queue.data_dir))?;
    let clock = SystemClock;

    match args.command {
        QueueCommand::Enqueue { job_id, dedup_key } => {
            let id = queue.enqueue(
                JobId::new(job_id),
                clock.epoch_ms(),
                EnqueueOptions {
                    priority: Priority::Normal,
                    dedup_key,
                    max_attempts: 0,
                    available_at: None,
                },
            )?;
            println!("{id}");
        }
        QueueCommand::List {} => {
            let mut tasks = queue.list();
            tasks.sort_by_key(|t| t.available_at);
            for task in tasks {
                println!(
                    "{}  {:<10?}  {:<9?}  job={}  attempts={}",
                    task.id, task.status, task.priority, task.job_id, task.attempts
                );
            }
        }
        QueueCommand::Show { task_id } => {
            let task = queue
                .get(&TaskRunId::new(task_id.clone()))
                .with_context(|| format!("task '{task_id}' not found"))?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        QueueCommand::Cancel { task_id } => {
            queue.cancel(&TaskRunId::new(task_id), clock.epoch_ms())?;
        }
    }

    queue.checkpoint()?;
    Ok(())
}
