// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! strmsync-adapters: driver and writer implementations (§4.A, §4.B).

pub mod driver;
pub mod rate_limit;
pub mod writer;

pub use driver::{
    BuildStrmInfoParams, Capabilities, ClouddriveDriver, Driver, DriverError, DriverType,
    LocalDriver, OpenlistDriver, ScanOptions, ScanStream,
};
pub use rate_limit::RateLimiter;
pub use writer::{StrmWriter, WriterError, WriterPermissions};

#[cfg(any(test, feature = "test-support"))]
pub use driver::fake::{FakeDriver, FakeDriverBuilder};
