// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake driver for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    BuildStrmInfoParams, Capabilities, Driver, DriverError, DriverType, ScanOptions, ScanStream,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use strmsync_core::{RemoteEntry, StrmInfo};
use tokio::sync::mpsc;

/// Recorded call to [`FakeDriver`].
#[derive(Debug, Clone)]
pub enum DriverCall {
    Scan { root: String },
    Stat { path: String },
    BuildStrmInfo { remote_path: String },
    TestConnection,
}

/// Fake backend driver for testing engine/adapter wiring without real
/// filesystem or network I/O.
#[derive(Clone)]
pub struct FakeDriver {
    inner: Arc<Mutex<FakeDriverState>>,
}

struct FakeDriverState {
    driver_type: DriverType,
    capabilities: Capabilities,
    entries: Vec<RemoteEntry>,
    stat_by_path: HashMap<String, RemoteEntry>,
    strm_info_by_path: HashMap<String, StrmInfo>,
    calls: Vec<DriverCall>,
    scan_error: Option<DriverError>,
    stat_error: Option<DriverError>,
    build_error: Option<DriverError>,
    test_connection_error: Option<DriverError>,
}

impl FakeDriver {
    pub fn builder() -> FakeDriverBuilder {
        FakeDriverBuilder::default()
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn push_entry(&self, entry: RemoteEntry) {
        self.inner.lock().entries.push(entry);
    }

    pub fn set_stat(&self, path: impl Into<String>, entry: RemoteEntry) {
        self.inner.lock().stat_by_path.insert(path.into(), entry);
    }

    pub fn set_strm_info(&self, path: impl Into<String>, info: StrmInfo) {
        self.inner
            .lock()
            .strm_info_by_path
            .insert(path.into(), info);
    }

    pub fn set_scan_error(&self, error: DriverError) {
        self.inner.lock().scan_error = Some(error);
    }

    pub fn set_test_connection_error(&self, error: DriverError) {
        self.inner.lock().test_connection_error = Some(error);
    }
}

/// Builder for a [`FakeDriver`] with preset capabilities and fixtures.
#[derive(Default)]
pub struct FakeDriverBuilder {
    driver_type: Option<DriverType>,
    capabilities: Capabilities,
    entries: Vec<RemoteEntry>,
}

impl FakeDriverBuilder {
    pub fn driver_type(mut self, driver_type: DriverType) -> Self {
        self.driver_type = Some(driver_type);
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_entry(mut self, entry: RemoteEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn build(self) -> FakeDriver {
        FakeDriver {
            inner: Arc::new(Mutex::new(FakeDriverState {
                driver_type: self.driver_type.unwrap_or(DriverType::Local),
                capabilities: self.capabilities,
                entries: self.entries,
                stat_by_path: HashMap::new(),
                strm_info_by_path: HashMap::new(),
                calls: Vec::new(),
                scan_error: None,
                stat_error: None,
                build_error: None,
                test_connection_error: None,
            })),
        }
    }
}

#[async_trait]
impl Driver for FakeDriver {
    fn driver_type(&self) -> DriverType {
        self.inner.lock().driver_type
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.lock().capabilities
    }

    async fn scan(&self, root: &str, _opts: ScanOptions) -> Result<ScanStream, DriverError> {
        let entries = {
            let mut inner = self.inner.lock();
            inner.calls.push(DriverCall::Scan {
                root: root.to_string(),
            });
            if let Some(error) = inner.scan_error.take() {
                return Err(error);
            }
            inner.entries.clone()
        };

        let (entries_tx, entries_rx) = mpsc::channel(entries.len().max(1));
        let (_errors_tx, errors_rx) = mpsc::channel(1);
        for entry in entries {
            let _ = entries_tx.send(entry).await;
        }
        Ok(ScanStream {
            entries: entries_rx,
            errors: errors_rx,
        })
    }

    async fn stat(&self, path: &str) -> Result<RemoteEntry, DriverError> {
        let mut inner = self.inner.lock();
        inner.calls.push(DriverCall::Stat {
            path: path.to_string(),
        });
        if let Some(error) = inner.stat_error.take() {
            return Err(error);
        }
        inner
            .stat_by_path
            .get(path)
            .cloned()
            .ok_or_else(|| DriverError::NotFound(path.to_string()))
    }

    async fn build_strm_info(&self, params: BuildStrmInfoParams) -> Result<StrmInfo, DriverError> {
        let mut inner = self.inner.lock();
        inner.calls.push(DriverCall::BuildStrmInfo {
            remote_path: params.remote_path.clone(),
        });
        if let Some(error) = inner.build_error.take() {
            return Err(error);
        }
        inner
            .strm_info_by_path
            .get(&params.remote_path)
            .cloned()
            .ok_or_else(|| DriverError::NotFound(params.remote_path))
    }

    async fn test_connection(&self) -> Result<(), DriverError> {
        let mut inner = self.inner.lock();
        inner.calls.push(DriverCall::TestConnection);
        match inner.test_connection_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
