// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-token rate limiter (§4.A): caps outbound API/download
//! concurrency per data server independent of the engine's own job-level
//! concurrency semaphore (§5).

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A cheap-to-clone concurrency cap. Cloning shares the same underlying
/// token pool; it does not create a new one.
#[derive(Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
}

impl RateLimiter {
    /// `max_concurrency` of 0 is coerced to 1: a limiter that never admits
    /// anyone is never useful and almost certainly a config mistake.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Acquire a token, waiting if the pool is exhausted. The returned
    /// guard releases the token on drop.
    pub async fn acquire(&self) -> RateLimitPermit {
        let semaphore = Arc::clone(&self.semaphore);
        let permit = semaphore
            .acquire_owned()
            .await
            .expect("rate limiter semaphore is never closed");
        RateLimitPermit { _permit: permit }
    }
}

pub struct RateLimitPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;
