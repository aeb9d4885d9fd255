// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

crate::define_id! {
    pub struct TestId;
}

#[test]
fn short_truncates_long_ids() {
    let id = TestId::new("0123456789abcdef");
    assert_eq!(id.short(8), "01234567");
}

#[test]
fn short_leaves_short_ids_untouched() {
    let id = TestId::new("abc");
    assert_eq!(id.short(8), "abc");
}

#[test]
fn sequential_id_gen_is_monotonic_and_unique() {
    let gen = SequentialIdGen::new("job");
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a, "job-1");
    assert_eq!(b, "job-2");
}

#[test]
fn uuid_id_gen_produces_distinct_values() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}
