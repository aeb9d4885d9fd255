// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! strmsyncd: the background process that owns the worker pool and cron
//! scheduler. Typically started via `strmsync daemon start`.

use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "strmsync.toml";

#[tokio::main]
async fn main() {
    let config_path = parse_config_path();
    setup_logging();

    tracing::info!(config = %config_path.display(), "starting strmsync daemon");

    if let Err(e) = strmsync_daemon::run(&config_path).await {
        tracing::error!(error = %e, "daemon exited with error");
        std::process::exit(1);
    }
}

fn parse_config_path() -> PathBuf {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            if let Some(path) = args.next() {
                return PathBuf::from(path);
            }
        }
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
