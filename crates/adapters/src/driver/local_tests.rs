// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use strmsync_core::StrmMode;
use tempfile::tempdir;

#[tokio::test]
async fn scan_finds_nested_files() {
    let dir = tempdir().expect("tempdir");
    tokio::fs::create_dir_all(dir.path().join("sub"))
        .await
        .expect("mkdir");
    tokio::fs::write(dir.path().join("a.mp4"), b"x")
        .await
        .expect("write");
    tokio::fs::write(dir.path().join("sub/b.mkv"), b"yy")
        .await
        .expect("write");

    let driver = LocalDriver::new(dir.path());
    let mut stream = driver.scan("", ScanOptions::default()).await.expect("scan");

    let mut names = Vec::new();
    while let Some(entry) = stream.entries.recv().await {
        names.push(entry.name);
    }
    assert!(stream.errors.recv().await.is_none());
    names.sort();
    assert_eq!(names, vec!["a.mp4", "b.mkv", "sub"]);
}

#[tokio::test]
async fn stat_missing_file_is_not_found() {
    let dir = tempdir().expect("tempdir");
    let driver = LocalDriver::new(dir.path());
    let err = driver.stat("missing.mp4").await.expect_err("should error");
    assert!(matches!(err, DriverError::NotFound(_)));
}

#[tokio::test]
async fn stat_existing_file_reports_size() {
    let dir = tempdir().expect("tempdir");
    tokio::fs::write(dir.path().join("a.mp4"), b"hello")
        .await
        .expect("write");
    let driver = LocalDriver::new(dir.path());
    let entry = driver.stat("a.mp4").await.expect("stat");
    assert_eq!(entry.size, 5);
    assert!(!entry.is_dir);
}

#[tokio::test]
async fn build_strm_info_in_local_mode_returns_mount_resolved_path() {
    let dir = tempdir().expect("tempdir");
    let driver = LocalDriver::new(dir.path());
    let info = driver
        .build_strm_info(BuildStrmInfoParams {
            server_id: "srv".into(),
            remote_path: "a.mp4".into(),
            remote_meta: None,
            strm_mode: StrmMode::Local,
        })
        .await
        .expect("build");
    assert_eq!(info.raw_url, dir.path().join("a.mp4").display().to_string());
}

#[tokio::test]
async fn build_strm_info_in_url_mode_is_not_supported() {
    let dir = tempdir().expect("tempdir");
    let driver = LocalDriver::new(dir.path());
    let err = driver
        .build_strm_info(BuildStrmInfoParams {
            server_id: "srv".into(),
            remote_path: "a.mp4".into(),
            remote_meta: None,
            strm_mode: StrmMode::Url,
        })
        .await
        .expect_err("local driver has no HTTP URL to offer");
    assert!(matches!(err, DriverError::NotSupported(_)));
}

#[tokio::test]
async fn test_connection_fails_for_missing_root() {
    let driver = LocalDriver::new("/nonexistent/path/for/strmsync/tests");
    let result = driver.test_connection().await;
    assert!(result.is_err());
}
