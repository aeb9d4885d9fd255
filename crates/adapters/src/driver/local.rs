// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local-mount driver (§4.A): the remote namespace is already mounted on
//! the local filesystem, so every operation is a thin `tokio::fs` call.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use strmsync_core::{RemoteEntry, StrmMode};
use tokio::sync::mpsc;

use super::{
    BuildStrmInfoParams, Capabilities, Driver, DriverError, DriverType, ScanOptions, ScanStream,
};

/// Scans a mounted directory tree in place. `mount_root` is the local
/// filesystem path the job's `source_root` is resolved against.
pub struct LocalDriver {
    mount_root: PathBuf,
}

impl LocalDriver {
    pub fn new(mount_root: impl Into<PathBuf>) -> Self {
        Self {
            mount_root: mount_root.into(),
        }
    }

    fn resolve(&self, rel: &str) -> PathBuf {
        self.mount_root.join(rel.trim_start_matches('/'))
    }
}

#[async_trait]
impl Driver for LocalDriver {
    fn driver_type(&self) -> DriverType {
        DriverType::Local
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            watch: true,
            strm_http: false,
            strm_mount: true,
            sign_url: false,
        }
    }

    async fn scan(&self, root: &str, opts: ScanOptions) -> Result<ScanStream, DriverError> {
        let start = self.resolve(root);
        let (entries_tx, entries) = mpsc::channel(256);
        let (errors_tx, errors) = mpsc::channel(32);
        let mount_root = self.mount_root.clone();

        tokio::spawn(async move {
            let mut stack = vec![(start, 0u32)];
            while let Some((dir, depth)) = stack.pop() {
                let mut read_dir = match tokio::fs::read_dir(&dir).await {
                    Ok(rd) => rd,
                    Err(e) => {
                        let _ = errors_tx
                            .send(DriverError::Retryable(format!(
                                "read_dir {}: {e}",
                                dir.display()
                            )))
                            .await;
                        continue;
                    }
                };
                loop {
                    let next = read_dir.next_entry().await;
                    let entry = match next {
                        Ok(Some(e)) => e,
                        Ok(None) => break,
                        Err(e) => {
                            let _ = errors_tx
                                .send(DriverError::Retryable(format!("readdir entry: {e}")))
                                .await;
                            break;
                        }
                    };
                    let meta = match entry.metadata().await {
                        Ok(m) => m,
                        Err(e) => {
                            let _ = errors_tx
                                .send(DriverError::Retryable(format!("metadata: {e}")))
                                .await;
                            continue;
                        }
                    };
                    let path = entry.path();
                    let rel = relative_unix(&mount_root, &path);
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let mod_time_ms = meta
                        .modified()
                        .ok()
                        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                        .map(|d| d.as_millis() as u64)
                        .unwrap_or(0);

                    if meta.is_dir() {
                        if opts.recursive && depth < opts.max_depth {
                            stack.push((path.clone(), depth + 1));
                        }
                        let _ = entries_tx
                            .send(RemoteEntry {
                                path: rel,
                                name,
                                size: 0,
                                mod_time_ms,
                                is_dir: true,
                            })
                            .await;
                    } else {
                        let _ = entries_tx
                            .send(RemoteEntry {
                                path: rel,
                                name,
                                size: meta.len(),
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
        let full = self.resolve(path);
        let meta = tokio::fs::metadata(&full)
            .await
            .map_err(|e| map_io_err(path, e))?;
        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mod_time_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(RemoteEntry {
            path: path.to_string(),
            name,
            size: if meta.is_dir() { 0 } else { meta.len() },
            mod_time_ms,
            is_dir: meta.is_dir(),
        })
    }

    async fn build_strm_info(
        &self,
        params: BuildStrmInfoParams,
    ) -> Result<strmsync_core::StrmInfo, DriverError> {
        match params.strm_mode {
            StrmMode::Local => {
                let full = self.resolve(&params.remote_path);
                Ok(strmsync_core::StrmInfo::new(
                    full.display().to_string(),
                    params.remote_path,
                ))
            }
            StrmMode::Url => Err(DriverError::NotSupported(
                "local driver does not serve HTTP(S) URLs".into(),
            )),
        }
    }

    async fn test_connection(&self) -> Result<(), DriverError> {
        tokio::fs::metadata(&self.mount_root)
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Permanent(format!("mount root unreachable: {e}")))
    }
}

fn relative_unix(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn map_io_err(path: &str, e: std::io::Error) -> DriverError {
    match e.kind() {
        std::io::ErrorKind::NotFound => DriverError::NotFound(path.to_string()),
        std::io::ErrorKind::PermissionDenied => {
            DriverError::Permanent(format!("permission denied: {path}"))
        }
        _ => DriverError::Retryable(format!("{path}: {e}")),
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
