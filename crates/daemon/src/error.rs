// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level daemon error (§4.E Shutdown).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("config error: {0}")]
    Config(#[from] strmsync_config::ConfigError),
    #[error("queue error: {0}")]
    Queue(#[from] strmsync_storage::QueueError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
