// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn data_server_converts_kind_and_timeout() {
    let raw = RawDataServer {
        id: "srv1".to_string(),
        name: "Primary".to_string(),
        kind: "openlist".to_string(),
        host: "127.0.0.1".to_string(),
        port: 5244,
        credential: Some("token".to_string()),
        mount_path: None,
        access_path: Some("/dav".to_string()),
        use_tls: false,
        rate_limit_per_sec: Some(5),
        max_retries: 3,
        request_timeout_secs: 10,
    };
    let server: DataServer = raw.try_into().expect("convert");
    assert_eq!(server.kind, DataServerKind::Openlist);
    assert_eq!(server.request_timeout, Duration::from_secs(10));
}

#[test]
fn unknown_data_server_kind_is_rejected() {
    let raw = RawDataServer {
        id: "srv1".to_string(),
        name: "Bad".to_string(),
        kind: "ftp".to_string(),
        host: String::new(),
        port: 0,
        credential: None,
        mount_path: None,
        access_path: None,
        use_tls: false,
        rate_limit_per_sec: None,
        max_retries: 3,
        request_timeout_secs: 30,
    };
    let result: Result<DataServer, ConfigError> = raw.try_into();
    assert!(result.is_err());
}

#[test]
fn job_options_fill_unset_fields_from_defaults() {
    let raw = RawJobOptions {
        extensions: vec![".mp4".to_string()],
        ..RawJobOptions::default()
    };
    let opts: JobOptions = raw.into();
    assert_eq!(opts.max_depth, 25);
    assert_eq!(opts.max_concurrency, 10);
    assert_eq!(opts.extensions, vec![".mp4".to_string()]);
}

#[test]
fn job_without_target_root_fails_validation() {
    let raw = RawJob {
        id: "job1".to_string(),
        name: "Movies".to_string(),
        enabled: true,
        cron: None,
        data_server_id: Some("srv1".to_string()),
        media_server_id: None,
        source_root: "/m".to_string(),
        target_root: String::new(),
        options: RawJobOptions::default(),
    };
    let result: Result<Job, ConfigError> = raw.try_into();
    assert!(matches!(result, Err(ConfigError::InvalidJob { .. })));
}

#[test]
fn job_converts_cleanly_with_minimal_fields() {
    let raw = RawJob {
        id: "job1".to_string(),
        name: "Movies".to_string(),
        enabled: true,
        cron: Some("0 */15 * * * *".to_string()),
        data_server_id: Some("srv1".to_string()),
        media_server_id: None,
        source_root: "/m".to_string(),
        target_root: "/out".to_string(),
        options: RawJobOptions::default(),
    };
    let job: Job = raw.try_into().expect("convert");
    assert!(job.is_cron_managed());
    assert_eq!(job.target_root, "/out");
}
