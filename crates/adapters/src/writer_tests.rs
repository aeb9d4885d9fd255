// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn write_then_read_round_trips() {
    let dir = tempdir().expect("tempdir");
    let writer = StrmWriter::new(dir.path());
    writer
        .write("movies/a.strm", "http://example/a.mp4", 0)
        .await
        .expect("write");
    let content = writer.read("movies/a.strm").await.expect("read");
    assert_eq!(content, "http://example/a.mp4");
}

#[tokio::test]
async fn write_sets_requested_mtime() {
    let dir = tempdir().expect("tempdir");
    let writer = StrmWriter::new(dir.path());
    writer
        .write("a.strm", "http://example/a.mp4", 1_700_000_000_000)
        .await
        .expect("write");
    let meta = tokio::fs::metadata(dir.path().join("a.strm"))
        .await
        .expect("metadata");
    let modified = meta.modified().expect("modified");
    let secs = modified
        .duration_since(std::time::UNIX_EPOCH)
        .expect("duration")
        .as_secs();
    assert_eq!(secs, 1_700_000_000);
}

#[tokio::test]
async fn delete_missing_file_is_success() {
    let dir = tempdir().expect("tempdir");
    let writer = StrmWriter::new(dir.path());
    writer.delete("missing.strm").await.expect("idempotent delete");
}

#[tokio::test]
async fn path_with_parent_dir_component_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let writer = StrmWriter::new(dir.path());
    let err = writer
        .write("../escape.strm", "x", 0)
        .await
        .expect_err("should reject");
    assert!(matches!(err, WriterError::InvalidInput(_)));
}

#[tokio::test]
async fn absolute_path_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let writer = StrmWriter::new(dir.path());
    let err = writer
        .write("/etc/passwd", "x", 0)
        .await
        .expect_err("should reject");
    assert!(matches!(err, WriterError::InvalidInput(_)));
}

#[tokio::test]
async fn prune_empty_parents_removes_chain_up_to_root() {
    let dir = tempdir().expect("tempdir");
    let writer = StrmWriter::new(dir.path());
    writer
        .write("a/b/c.strm", "http://example/c.mp4", 0)
        .await
        .expect("write");
    writer.delete("a/b/c.strm").await.expect("delete");
    writer
        .prune_empty_parents("a/b/c.strm")
        .await
        .expect("prune");
    assert!(!tokio::fs::try_exists(dir.path().join("a/b")).await.unwrap_or(true));
    assert!(!tokio::fs::try_exists(dir.path().join("a")).await.unwrap_or(true));
    assert!(tokio::fs::try_exists(dir.path()).await.unwrap_or(false));
}

#[tokio::test]
async fn prune_empty_parents_stops_if_sibling_remains() {
    let dir = tempdir().expect("tempdir");
    let writer = StrmWriter::new(dir.path());
    writer
        .write("a/b/c.strm", "http://example/c.mp4", 0)
        .await
        .expect("write");
    writer
        .write("a/sibling.strm", "http://example/sibling.mp4", 0)
        .await
        .expect("write");
    writer.delete("a/b/c.strm").await.expect("delete");
    writer
        .prune_empty_parents("a/b/c.strm")
        .await
        .expect("prune");
    assert!(!tokio::fs::try_exists(dir.path().join("a/b")).await.unwrap_or(true));
    assert!(tokio::fs::try_exists(dir.path().join("a")).await.unwrap_or(false));
}
