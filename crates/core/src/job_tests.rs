// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::server::DataServerId;

fn base_job() -> Job {
    Job {
        id: JobId::new("job-1"),
        name: "movies".to_string(),
        enabled: true,
        cron: Some("0 * * * *".to_string()),
        data_server_id: Some(DataServerId::new("srv-1")),
        media_server_id: None,
        source_root: "/media".to_string(),
        target_root: "/out".to_string(),
        options: JobOptions::default(),
    }
}

#[test]
fn is_cron_managed_requires_enabled_and_nonempty_cron() {
    let mut job = base_job();
    assert!(job.is_cron_managed());

    job.cron = Some(String::new());
    assert!(!job.is_cron_managed());

    job.cron = Some("0 * * * *".to_string());
    job.enabled = false;
    assert!(!job.is_cron_managed());

    job.enabled = true;
    job.cron = None;
    assert!(!job.is_cron_managed());
}

#[test]
fn validate_rejects_empty_name_or_target_root_or_missing_server() {
    let mut job = base_job();
    job.name = "  ".to_string();
    assert!(job.validate().is_err());

    let mut job = base_job();
    job.target_root = String::new();
    assert!(job.validate().is_err());

    let mut job = base_job();
    job.data_server_id = None;
    assert!(job.validate().is_err());

    assert!(base_job().validate().is_ok());
}

#[test]
fn options_coerce_non_positive_tunables_to_defaults() {
    let mut opts = JobOptions::default();
    opts.max_concurrency = 0;
    opts.mod_time_epsilon_secs = -5;
    assert_eq!(opts.effective_max_concurrency(), 10);
    assert_eq!(opts.effective_mod_time_epsilon_secs(), 2);

    opts.max_concurrency = 3;
    opts.mod_time_epsilon_secs = 7;
    assert_eq!(opts.effective_max_concurrency(), 3);
    assert_eq!(opts.effective_mod_time_epsilon_secs(), 7);
}

#[test]
fn empty_extension_whitelist_accepts_everything() {
    let opts = JobOptions::default();
    assert!(opts.accepts_extension("a.mkv"));
}

#[test]
fn extension_whitelist_matches_case_insensitively() {
    let mut opts = JobOptions::default();
    opts.extensions = vec![".mp4".to_string()];
    assert!(opts.accepts_extension("a.MP4"));
    assert!(!opts.accepts_extension("a.nfo"));
}

#[test]
fn replace_rule_substitutes_matching_prefix_only() {
    let rule = ReplaceRule {
        from: "/mnt/a".to_string(),
        to: "/mnt/b".to_string(),
    };
    assert_eq!(rule.apply("/mnt/a/movie.mp4"), "/mnt/b/movie.mp4");
    assert_eq!(rule.apply("/other/movie.mp4"), "/other/movie.mp4");
}
