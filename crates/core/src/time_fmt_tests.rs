// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn formats_seconds() {
    assert_eq!(format_elapsed(5), "5s");
}

#[test]
fn formats_minutes() {
    assert_eq!(format_elapsed(125), "2m");
}

#[test]
fn formats_hours_with_minutes() {
    assert_eq!(format_elapsed(5400), "1h30m");
}

#[test]
fn formats_whole_hours_without_minutes() {
    assert_eq!(format_elapsed(7200), "2h");
}

#[test]
fn formats_days() {
    assert_eq!(format_elapsed(172_800), "2d");
}

#[test]
fn formats_millis_via_seconds() {
    assert_eq!(format_elapsed_ms(125_000), "2m");
}
