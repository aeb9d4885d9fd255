// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DataServer: a configured remote source (§3).

use serde::{Deserialize, Serialize};
use std::time::Duration;

crate::define_id! {
    /// Unique identifier for a configured data server.
    #[derive(Default)]
    pub struct DataServerId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataServerKind {
    Local,
    Clouddrive2,
    Openlist,
}

/// A configured remote source (§3). Credentials are assumed already
/// decrypted by the repository layer (§4.G note).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataServer {
    pub id: DataServerId,
    pub name: String,
    pub kind: DataServerKind,
    pub host: String,
    pub port: u16,
    pub credential: Option<String>,
    /// Local mount path (for `local` and mount-mode drivers).
    pub mount_path: Option<String>,
    /// Base access path prefix within the remote namespace.
    pub access_path: Option<String>,
    pub use_tls: bool,
    pub rate_limit_per_sec: Option<u32>,
    pub max_retries: u32,
    pub request_timeout: Duration,
}

impl DataServer {
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}
