// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use strmsync_core::{DataServerId, JobId};

const SAMPLE: &str = r#"
[engine]
max_concurrency = 5

[queue]
data_dir = "/var/lib/strmsync"
worker_count = 2

[[data_server]]
id = "srv1"
name = "Primary"
kind = "local"
mount_path = "/mnt/media"

[[job]]
id = "job1"
name = "Movies"
cron = "0 */15 * * * *"
data_server_id = "srv1"
source_root = "/movies"
target_root = "/out/movies"

[job.options]
extensions = [".mp4", ".mkv"]
orphan_cleanup = true
"#;

#[tokio::test]
async fn load_parses_servers_and_jobs() {
    let config = FileConfig::parse(SAMPLE, "test.toml").expect("parse");
    assert_eq!(config.engine.max_concurrency, 5);
    assert_eq!(config.queue.worker_count, 2);

    let server = config
        .data_servers
        .get_by_id(&DataServerId::new("srv1"))
        .await
        .expect("server");
    assert_eq!(server.name, "Primary");

    let jobs = config.jobs.list_enabled().await.expect("jobs");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].options.extensions, vec![".mp4", ".mkv"]);
}

#[tokio::test]
async fn get_by_id_on_missing_job_is_not_found() {
    let config = FileConfig::parse(SAMPLE, "test.toml").expect("parse");
    let result = config.jobs.get_by_id(&JobId::new("missing")).await;
    assert!(matches!(result, Err(RepoError::NotFound(_))));
}

#[test]
fn job_referencing_unknown_server_is_rejected() {
    let toml = r#"
[[job]]
id = "job1"
name = "Movies"
data_server_id = "nonexistent"
source_root = "/m"
target_root = "/out"
"#;
    let result = FileConfig::parse(toml, "test.toml");
    assert!(matches!(result, Err(ConfigError::UnknownDataServer(_, _))));
}

#[test]
fn disabled_job_is_excluded_from_list_enabled() {
    let toml = r#"
[[data_server]]
id = "srv1"
name = "Primary"
kind = "local"

[[job]]
id = "job1"
name = "Movies"
enabled = false
data_server_id = "srv1"
source_root = "/m"
target_root = "/out"
"#;
    let config = FileConfig::parse(toml, "test.toml").expect("parse");
    assert_eq!(config.jobs.jobs.len(), 1);
}
