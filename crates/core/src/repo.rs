// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository contracts consumed by the core (§4.G).
//!
//! These traits are the seam between the durable/queue-owning parts of the
//! system and whatever persists Job/DataServer configuration — out of
//! scope per §1, but the core still needs a way to read them.

use crate::job::{Job, JobId};
use crate::run_event::RunEvent;
use crate::server::{DataServer, DataServerId};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("repository error: {0}")]
    Other(String),
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn get_by_id(&self, id: &JobId) -> Result<Job, RepoError>;
    async fn list_enabled(&self) -> Result<Vec<Job>, RepoError>;
}

#[async_trait]
pub trait DataServerRepository: Send + Sync {
    /// Includes decrypted credentials and timeouts (§4.G note — decryption
    /// itself is out of scope; the repository hands back plaintext fields).
    async fn get_by_id(&self, id: &DataServerId) -> Result<DataServer, RepoError>;
}

#[derive(Debug, Error)]
pub enum EventSinkError {
    #[error("sink overwhelmed, event dropped")]
    Dropped,
}

/// Non-blocking append of per-file outcome events (§4.G, §4.H). A slow or
/// full sink drops events (with a counter) rather than stalling the engine.
pub trait RunEventSink: Send + Sync {
    fn append(&self, event: RunEvent) -> Result<(), EventSinkError>;

    /// Number of events dropped since the sink was created.
    fn dropped_count(&self) -> u64 {
        0
    }
}

/// A sink that discards everything; used when no observer is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl RunEventSink for NullEventSink {
    fn append(&self, _event: RunEvent) -> Result<(), EventSinkError> {
        Ok(())
    }
}
