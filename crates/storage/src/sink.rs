// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapts [`Queue::append_run_event`] to the core [`RunEventSink`] contract
//! (§4.H) so the daemon can hand the same queue it polls to the engine as
//! its observability sink.

use std::sync::Arc;

use strmsync_core::{EventSinkError, IdGen, RunEvent, RunEventSink};

use crate::queue::Queue;

pub struct QueueEventSink<G: IdGen + 'static> {
    queue: Arc<Queue<G>>,
}

impl<G: IdGen + 'static> QueueEventSink<G> {
    pub fn new(queue: Arc<Queue<G>>) -> Self {
        Self { queue }
    }
}

impl<G: IdGen + 'static> RunEventSink for QueueEventSink<G> {
    fn append(&self, event: RunEvent) -> Result<(), EventSinkError> {
        self.queue
            .append_run_event(event)
            .map_err(|_| EventSinkError::Dropped)
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
