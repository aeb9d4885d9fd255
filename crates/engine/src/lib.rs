// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! strmsync-engine: the sync engine, worker pool, and cron scheduler
//! (§4.C, §4.E, §4.F).

pub mod error;
pub mod scheduler;
pub mod stats;
pub mod sync;
pub mod worker_pool;

pub use error::RuntimeError;
pub use scheduler::{Scheduler, SchedulerError};
pub use stats::{FileErrorRecord, Stats};
pub use sync::{SyncEngine, SyncError};
pub use worker_pool::{DefaultDriverFactory, DriverFactory, WorkerPool, WorkerPoolConfig};
