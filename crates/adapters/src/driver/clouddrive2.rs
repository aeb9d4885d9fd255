// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CloudDrive2 driver (§4.A).
//!
//! CloudDrive2's native interface is a gRPC service. This talks instead to
//! CloudDrive2's bundled local HTTP gateway (the same REST surface its own
//! web UI uses), which re-exposes the gRPC calls as plain JSON over HTTP.
//! That keeps the dependency stack aligned with the rest of the crate
//! instead of introducing a standalone `tonic`/`prost` codegen pipeline
//! for a single driver.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use strmsync_core::{RemoteEntry, StrmMode};
use tokio::sync::mpsc;

use super::{
    BuildStrmInfoParams, Capabilities, Driver, DriverError, DriverType, ScanOptions, ScanStream,
};
use crate::rate_limit::RateLimiter;

#[derive(Debug, Deserialize)]
struct FindFileResponse {
    files: Vec<CloudFile>,
}

#[derive(Debug, Deserialize)]
struct CloudFile {
    full_path: String,
    file_name: String,
    file_size: u64,
    is_directory: bool,
    write_time: String,
}

#[derive(Debug, Deserialize)]
struct DownloadUrlResponse {
    url: String,
}

/// A client of CloudDrive2's local gateway, reachable at `gateway_url`
/// (defaults to its own default port when constructed via
/// [`ClouddriveDriver::new`]).
pub struct ClouddriveDriver {
    client: reqwest::Client,
    gateway_url: String,
    limiter: RateLimiter,
}

impl ClouddriveDriver {
    pub fn new(gateway_url: impl Into<String>, max_concurrency: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            gateway_url: gateway_url.into().trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(max_concurrency),
        }
    }

    async fn find_files(&self, path: &str) -> Result<Vec<CloudFile>, DriverError> {
        let _permit = self.limiter.acquire().await;
        let resp = self
            .client
            .get(format!("{}/api/fs/list", self.gateway_url))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(map_reqwest_err)?;
        if !resp.status().is_success() {
            return Err(status_err(resp.status()));
        }
        let body: FindFileResponse = resp.json().await.map_err(map_reqwest_err)?;
        Ok(body.files)
    }
}

#[async_trait]
impl Driver for ClouddriveDriver {
    fn driver_type(&self) -> DriverType {
        DriverType::Clouddrive2
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            watch: false,
            strm_http: true,
            // CloudDrive2 itself can be FUSE-mounted, but this driver only
            // talks to its HTTP gateway and has no mount path to resolve.
            strm_mount: false,
            sign_url: true,
        }
    }

    async fn scan(&self, root: &str, opts: ScanOptions) -> Result<ScanStream, DriverError> {
        let (entries_tx, entries) = mpsc::channel(256);
        let (errors_tx, errors) = mpsc::channel(32);
        let root = root.to_string();
        let client = self.client.clone();
        let gateway_url = self.gateway_url.clone();
        let limiter = self.limiter.clone();

        tokio::spawn(async move {
            let worker = ClouddriveDriver {
                client,
                gateway_url,
                limiter,
            };
            let mut stack = vec![(root, 0u32)];
            while let Some((path, depth)) = stack.pop() {
                let files = match worker.find_files(&path).await {
                    Ok(files) => files,
                    Err(e) => {
                        let _ = errors_tx.send(e).await;
                        continue;
                    }
                };
                for file in files {
                    let mod_time_ms = parse_write_time_ms(&file.write_time);
                    if file.is_directory {
                        if opts.recursive && depth < opts.max_depth {
                            stack.push((file.full_path.clone(), depth + 1));
                        }
                        let _ = entries_tx
                            .send(RemoteEntry {
                                path: file.full_path,
                                name: file.file_name,
                                size: 0,
                                mod_time_ms,
                                is_dir: true,
                            })
                            .await;
                    } else {
                        let _ = entries_tx
                            .send(RemoteEntry {
                                path: file.full_path,
                                name: file.file_name,
                                size: file.file_size,
                                mod_time_ms,
                                is_dir: false,
                            })
                            .await;
                    }
                }
            }
        });

        Ok(ScanStream { entries, errors })
    }

    async fn stat(&self, path: &str) -> Result<RemoteEntry, DriverError> {
        let (parent, name) = path.rsplit_once('/').unwrap_or(("/", path));
        let files = self.find_files(parent).await?;
        let file = files
            .into_iter()
            .find(|f| f.file_name == name)
            .ok_or_else(|| DriverError::NotFound(path.to_string()))?;
        Ok(RemoteEntry {
            path: file.full_path,
            name: file.file_name,
            size: file.file_size,
            mod_time_ms: parse_write_time_ms(&file.write_time),
            is_dir: file.is_directory,
        })
    }

    async fn build_strm_info(
        &self,
        params: BuildStrmInfoParams,
    ) -> Result<strmsync_core::StrmInfo, DriverError> {
        if params.strm_mode == StrmMode::Local {
            return Err(DriverError::NotSupported(
                "clouddrive2 gateway driver has no local mount path to offer".into(),
            ));
        }
        let _permit = self.limiter.acquire().await;
        let resp = self
            .client
            .get(format!("{}/api/fs/download_url", self.gateway_url))
            .query(&[("path", params.remote_path.as_str())])
            .send()
            .await
            .map_err(map_reqwest_err)?;
        if !resp.status().is_success() {
            return Err(status_err(resp.status()));
        }
        let body: DownloadUrlResponse = resp.json().await.map_err(map_reqwest_err)?;
        let mut info = strmsync_core::StrmInfo::new(body.url.clone(), params.remote_path);
        info.base_url = Some(self.gateway_url.clone());
        if body.url.contains("expire") {
            if let Some(meta) = params.remote_meta {
                info.expires_at_ms = Some(meta.mod_time_ms);
            }
        }
        Ok(info)
    }

    async fn test_connection(&self) -> Result<(), DriverError> {
        let _permit = self.limiter.acquire().await;
        let resp = self
            .client
            .get(format!("{}/api/fs/list", self.gateway_url))
            .query(&[("path", "/")])
            .send()
            .await
            .map_err(map_reqwest_err)?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(status_err(resp.status()))
        }
    }
}

/// CloudDrive2 reports write times as RFC3339; malformed values fall back
/// to 0 rather than failing the whole scan.
fn parse_write_time_ms(s: &str) -> u64 {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp_millis().max(0) as u64)
        .unwrap_or(0)
}

fn map_reqwest_err(e: reqwest::Error) -> DriverError {
    if e.is_timeout() || e.is_connect() {
        DriverError::Retryable(e.to_string())
    } else {
        DriverError::Permanent(e.to_string())
    }
}

fn status_err(status: reqwest::StatusCode) -> DriverError {
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        DriverError::Retryable(format!("clouddrive2 gateway status {status}"))
    } else {
        DriverError::Permanent(format!("clouddrive2 gateway status {status}"))
    }
}

#[cfg(test)]
#[path = "clouddrive2_tests.rs"]
mod tests;
