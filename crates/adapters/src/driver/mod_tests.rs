// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

struct Noop;

#[async_trait]
impl Driver for Noop {
    fn driver_type(&self) -> DriverType {
        DriverType::Local
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
    async fn scan(&self, _root: &str, _opts: ScanOptions) -> Result<ScanStream, DriverError> {
        let (_tx_e, entries) = mpsc::channel(1);
        let (_tx_err, errors) = mpsc::channel(1);
        Ok(ScanStream { entries, errors })
    }
    async fn stat(&self, path: &str) -> Result<RemoteEntry, DriverError> {
        Err(DriverError::NotFound(path.to_string()))
    }
    async fn build_strm_info(
        &self,
        _params: BuildStrmInfoParams,
    ) -> Result<StrmInfo, DriverError> {
        Err(DriverError::NotSupported("noop".into()))
    }
    async fn test_connection(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[test]
fn driver_error_kind_classification() {
    assert_eq!(DriverError::Cancelled.kind(), ErrorKind::Cancelled);
    assert_eq!(
        DriverError::Retryable("x".into()).kind(),
        ErrorKind::Retryable
    );
    assert_eq!(
        DriverError::Permanent("x".into()).kind(),
        ErrorKind::Permanent
    );
    assert_eq!(
        DriverError::NotFound("x".into()).kind(),
        ErrorKind::Permanent
    );
}

#[test]
fn driver_type_display() {
    assert_eq!(DriverType::Local.to_string(), "local");
    assert_eq!(DriverType::Clouddrive2.to_string(), "clouddrive2");
    assert_eq!(DriverType::Openlist.to_string(), "openlist");
}

#[test]
fn compare_strm_equal_ignores_surrounding_whitespace() {
    let noop = Noop;
    let expected = StrmInfo::new("http://x/a.mp4", "a.mp4");
    let cmp = noop.compare_strm(&expected, " http://x/a.mp4\n");
    assert!(cmp.equal);
    assert!(!cmp.need_update);
    assert!(cmp.reason.is_none());
}

#[test]
fn compare_strm_detects_base_url_mismatch() {
    let noop = Noop;
    let mut expected = StrmInfo::new("http://a.example/a.mp4", "a.mp4");
    expected.base_url = Some("http://a.example".to_string());
    let cmp = noop.compare_strm(&expected, "http://b.example/a.mp4");
    assert!(!cmp.equal);
    assert_eq!(cmp.reason, Some(CompareMismatch::BaseUrl));
}

#[test]
fn compare_strm_detects_expiry_mismatch() {
    let noop = Noop;
    let mut expected = StrmInfo::new("http://a.example/a.mp4?expire=99", "a.mp4");
    expected.expires_at_ms = Some(123);
    let cmp = noop.compare_strm(&expected, "http://a.example/a.mp4");
    assert!(!cmp.equal);
    assert_eq!(cmp.reason, Some(CompareMismatch::Expiry));
}

#[test]
fn compare_strm_falls_back_to_path_reason() {
    let noop = Noop;
    let expected = StrmInfo::new("http://a.example/a.mp4", "a.mp4");
    let cmp = noop.compare_strm(&expected, "http://a.example/b.mp4");
    assert!(!cmp.equal);
    assert_eq!(cmp.reason, Some(CompareMismatch::Path));
}
