// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OpenList driver (§4.A): talks to an OpenList server's JSON HTTP API
//! (`/api/fs/list`, `/api/fs/get`) to enumerate and resolve remote entries.

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
struct ListResponse {
    data: ListData,
}

#[derive(Debug, Deserialize)]
struct ListData {
    content: Vec<ListItem>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    name: String,
    size: u64,
    is_dir: bool,
    modified: String,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    data: GetData,
}

#[derive(Debug, Deserialize)]
struct GetData {
    raw_url: String,
    sign: Option<String>,
}

/// A server-side OpenList client (§4.A). `base_url` carries no trailing
/// slash; `token` is sent as the `Authorization` header verbatim.
pub struct OpenlistDriver {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    limiter: RateLimiter,
}

impl OpenlistDriver {
    pub fn new(base_url: impl Into<String>, token: Option<String>, max_concurrency: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            limiter: RateLimiter::new(max_concurrency),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.header("Authorization", token.clone());
        }
        req
    }

    async fn list_one(&self, path: &str) -> Result<Vec<ListItem>, DriverError> {
        let _permit = self.limiter.acquire().await;
        let resp = self
            .request(reqwest::Method::POST, "/api/fs/list")
            .json(&serde_json::json!({ "path": path, "refresh": false }))
            .send()
            .await
            .map_err(map_reqwest_err)?;
        if !resp.status().is_success() {
            return Err(status_err(resp.status()));
        }
        let body: ListResponse = resp.json().await.map_err(map_reqwest_err)?;
        Ok(body.data.content)
    }
}

#[async_trait]
impl Driver for OpenlistDriver {
    fn driver_type(&self) -> DriverType {
        DriverType::Openlist
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            watch: false,
            strm_http: true,
            strm_mount: false,
            sign_url: true,
        }
    }

    async fn scan(&self, root: &str, opts: ScanOptions) -> Result<ScanStream, DriverError> {
        let (entries_tx, entries) = mpsc::channel(256);
        let (errors_tx, errors) = mpsc::channel(32);
        let root = root.to_string();

        // OpenlistDriver is cheaply Clone-able in spirit (shared client), but
        // Driver::scan takes &self so we fan the recursion out inline on a
        // detached task holding owned copies of what it needs.
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let token = self.token.clone();
        let limiter = self.limiter.clone();

        tokio::spawn(async move {
            let worker = OpenlistDriver {
                client,
                base_url,
                token,
                limiter,
            };
            let mut stack = vec![(root, 0u32)];
            while let Some((path, depth)) = stack.pop() {
                let items = match worker.list_one(&path).await {
                    Ok(items) => items,
                    Err(e) => {
                        let _ = errors_tx.send(e).await;
                        continue;
                    }
                };
                for item in items {
                    let rel = if path.is_empty() || path == "/" {
                        format!("/{}", item.name)
                    } else {
                        format!("{}/{}", path.trim_end_matches('/'), item.name)
                    };
                    let mod_time_ms = parse_rfc3339_ms(&item.modified);
                    if item.is_dir {
                        if opts.recursive && depth < opts.max_depth {
                            stack.push((rel.clone(), depth + 1));
                        }
                        let _ = entries_tx
                            .send(RemoteEntry {
                                path: rel,
                                name: item.name,
                                size: 0,
                                mod_time_ms,
                                is_dir: true,
                            })
                            .await;
                    } else {
                        let _ = entries_tx
                            .send(RemoteEntry {
                                path: rel,
                                name: item.name,
                                size: item.size,
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
        let (parent, name) = split_parent(path);
        let items = self.list_one(&parent).await?;
        let item = items
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| DriverError::NotFound(path.to_string()))?;
        Ok(RemoteEntry {
            path: path.to_string(),
            name: item.name,
            size: item.size,
            mod_time_ms: parse_rfc3339_ms(&item.modified),
            is_dir: item.is_dir,
        })
    }

    async fn build_strm_info(
        &self,
        params: BuildStrmInfoParams,
    ) -> Result<strmsync_core::StrmInfo, DriverError> {
        if params.strm_mode == StrmMode::Local {
            return Err(DriverError::NotSupported(
                "openlist has no local mount path to offer".into(),
            ));
        }
        let _permit = self.limiter.acquire().await;
        let resp = self
            .request(reqwest::Method::POST, "/api/fs/get")
            .json(&serde_json::json!({ "path": params.remote_path }))
            .send()
            .await
            .map_err(map_reqwest_err)?;
        if !resp.status().is_success() {
            return Err(status_err(resp.status()));
        }
        let body: GetResponse = resp.json().await.map_err(map_reqwest_err)?;
        let mut info =
            strmsync_core::StrmInfo::new(body.data.raw_url.clone(), params.remote_path);
        info.base_url = Some(self.base_url.clone());
        if body.data.sign.is_some() {
            if let Some(meta) = params.remote_meta {
                info.expires_at_ms = Some(meta.mod_time_ms);
            }
        }
        Ok(info)
    }

    async fn test_connection(&self) -> Result<(), DriverError> {
        let _permit = self.limiter.acquire().await;
        let resp = self
            .request(reqwest::Method::GET, "/ping")
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

fn split_parent(path: &str) -> (String, String) {
    match path.rfind('/') {
        Some(idx) if idx > 0 => (path[..idx].to_string(), path[idx + 1..].to_string()),
        Some(_) => ("/".to_string(), path[1..].to_string()),
        None => (String::new(), path.to_string()),
    }
}

/// Best-effort RFC3339 -> epoch ms; malformed timestamps fall back to 0
/// rather than failing the whole scan.
fn parse_rfc3339_ms(s: &str) -> u64 {
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
        DriverError::Retryable(format!("openlist status {status}"))
    } else {
        DriverError::Permanent(format!("openlist status {status}"))
    }
}

#[cfg(test)]
#[path = "openlist_tests.rs"]
mod tests;
