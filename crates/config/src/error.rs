// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("job '{0}' references unknown data_server_id '{1}'")]
    UnknownDataServer(String, String),
    #[error("invalid job definition '{name}': {reason}")]
    InvalidJob { name: String, reason: String },
}
