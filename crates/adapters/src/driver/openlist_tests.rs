// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn split_parent_handles_nested_and_root_paths() {
    assert_eq!(
        split_parent("/movies/a.mp4"),
        ("/movies".to_string(), "a.mp4".to_string())
    );
    assert_eq!(
        split_parent("/a.mp4"),
        ("/".to_string(), "a.mp4".to_string())
    );
}

#[test]
fn parse_rfc3339_ms_parses_valid_timestamp() {
    let ms = parse_rfc3339_ms("2024-01-01T00:00:00Z");
    assert!(ms > 0);
}

#[test]
fn parse_rfc3339_ms_falls_back_to_zero_on_garbage() {
    assert_eq!(parse_rfc3339_ms("not-a-timestamp"), 0);
}

#[test]
fn capabilities_advertise_http_and_sign_only() {
    let driver = OpenlistDriver::new("http://localhost:5244", None, 4);
    let caps = driver.capabilities();
    assert!(caps.strm_http);
    assert!(caps.sign_url);
    assert!(!caps.strm_mount);
    assert!(!caps.watch);
}

#[test]
fn base_url_strips_trailing_slash() {
    let driver = OpenlistDriver::new("http://localhost:5244/", None, 4);
    assert_eq!(driver.base_url, "http://localhost:5244");
}
