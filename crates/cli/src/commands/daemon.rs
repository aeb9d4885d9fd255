// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `strmsync daemon` — run the scheduler and worker pool in the foreground.
//!
//! There is no background/detach mode or IPC to an already-running daemon:
//! operators supervise `strmsyncd`/`strmsync daemon start` with systemd (or
//! an equivalent process manager) the same way they would any other
//! long-running service.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the foreground (scheduler + worker pool)
    Start {},
}

pub async fn handle(args: DaemonArgs, config_path: &Path) -> Result<()> {
    match args.command {
        DaemonCommand::Start {} => {
            strmsync_daemon::run(config_path).await?;
            Ok(())
        }
    }
}
