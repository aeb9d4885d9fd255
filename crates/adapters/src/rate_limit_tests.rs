// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn limiter_caps_concurrent_holders() {
    let limiter = RateLimiter::new(2);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let limiter = limiter.clone();
        let in_flight = Arc::clone(&in_flight);
        let max_seen = Arc::clone(&max_seen);
        handles.push(tokio::spawn(async move {
            let _permit = limiter.acquire().await;
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
        }));
    }
    for h in handles {
        h.await.expect("task panicked");
    }
    assert!(max_seen.load(Ordering::SeqCst) <= 2);
}

#[test]
fn zero_concurrency_coerced_to_one() {
    let limiter = RateLimiter::new(0);
    assert_eq!(limiter.max_concurrency(), 1);
}

#[tokio::test]
async fn clone_shares_the_same_pool() {
    let limiter = RateLimiter::new(1);
    let clone = limiter.clone();
    let _permit = limiter.acquire().await;
    assert_eq!(clone.max_concurrency(), 0);
}
