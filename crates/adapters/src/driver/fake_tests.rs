// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample_entry(path: &str) -> RemoteEntry {
    RemoteEntry {
        path: path.to_string(),
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        size: 10,
        mod_time_ms: 1_700_000_000_000,
        is_dir: false,
    }
}

#[tokio::test]
async fn scan_replays_pushed_entries_and_records_call() {
    let driver = FakeDriver::builder().with_entry(sample_entry("/a.mp4")).build();
    driver.push_entry(sample_entry("/b.mkv"));

    let mut stream = driver.scan("/", ScanOptions::default()).await.expect("scan");
    let mut names = Vec::new();
    while let Some(entry) = stream.entries.recv().await {
        names.push(entry.path);
    }
    names.sort();
    assert_eq!(names, vec!["/a.mp4", "/b.mkv"]);

    let calls = driver.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(&calls[0], DriverCall::Scan { root } if root == "/"));
}

#[tokio::test]
async fn scan_error_is_returned_once_then_cleared() {
    let driver = FakeDriver::builder().build();
    driver.set_scan_error(DriverError::Retryable("boom".into()));

    let err = driver.scan("/", ScanOptions::default()).await.expect_err("should fail");
    assert!(matches!(err, DriverError::Retryable(_)));

    let ok = driver.scan("/", ScanOptions::default()).await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn stat_returns_not_found_for_unregistered_path() {
    let driver = FakeDriver::builder().build();
    let err = driver.stat("/missing.mp4").await.expect_err("should fail");
    assert!(matches!(err, DriverError::NotFound(_)));
}

#[tokio::test]
async fn stat_returns_registered_entry() {
    let driver = FakeDriver::builder().build();
    driver.set_stat("/a.mp4", sample_entry("/a.mp4"));
    let entry = driver.stat("/a.mp4").await.expect("stat");
    assert_eq!(entry.size, 10);
}

#[tokio::test]
async fn test_connection_honors_preset_error() {
    let driver = FakeDriver::builder().build();
    driver.set_test_connection_error(DriverError::Permanent("down".into()));
    assert!(driver.test_connection().await.is_err());
    assert_eq!(driver.calls().len(), 1);
}

#[test]
fn clear_calls_empties_the_log() {
    let driver = FakeDriver::builder().build();
    driver.clear_calls();
    assert!(driver.calls().is_empty());
}
