// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn run_returns_config_error_for_missing_config_file() {
    let result = run(Path::new("/nonexistent/strmsync.toml")).await;
    assert!(matches!(result, Err(DaemonError::Config(_))));
}
