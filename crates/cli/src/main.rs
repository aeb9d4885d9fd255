// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! strmsync - media-sync CLI

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{daemon, queue, run, worker};

#[derive(Parser)]
#[command(name = "strmsync", version, about = "Sync a remote media namespace into local .strm files")]
struct Cli {
    /// Path to the TOML config file describing jobs and data servers
    #[arg(short = 'c', long = "config", global = true, default_value = "strmsync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job's sync once, in the foreground, bypassing the queue
    RunOnce(run::RunOnceArgs),
    /// Queue management
    Queue(queue::QueueArgs),
    /// Worker pool management
    Worker(worker::WorkerArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() {
    setup_logging();
    if let Err(e) = run_cli().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::RunOnce(args) => run::handle(args, &cli.config).await,
        Commands::Queue(args) => queue::handle(args, &cli.config).await,
        Commands::Worker(args) => worker::handle(args, &cli.config).await,
        Commands::Daemon(args) => daemon::handle(args, &cli.config).await,
    }
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
