// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pure update-decision function (§4.C).
//!
//! This is the single authoritative decision path: the sync engine never
//! also consults a driver's `CompareStrm` result to decide whether to
//! rewrite a file.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    New,
    Forced,
    Content,
    ModTime,
    Unchanged,
}

/// Inputs to [`decide_update`] (§4.C).
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput {
    pub local_exists: bool,
    /// UTC epoch milliseconds, truncated to 1s (§9). Ignored when `local_exists` is false.
    pub local_mod_time_ms: u64,
    pub remote_mod_time_ms: u64,
    pub content_equal: bool,
    pub force_update: bool,
    /// mtime equality tolerance in seconds; already coerced to its default via
    /// [`crate::job::JobOptions::effective_mod_time_epsilon_secs`].
    pub mod_time_epsilon_secs: i64,
}

/// `true` when two UTC-truncated mod times differ by more than `epsilon` seconds (§8).
///
/// Total and symmetric: `modTimeDifferent(a, a, eps) == false` for any `eps >= 0`,
/// and `modTimeDifferent(a, b, eps) == modTimeDifferent(b, a, eps)`.
pub fn mod_time_different(a_ms: u64, b_ms: u64, epsilon_secs: i64) -> bool {
    let epsilon_ms = epsilon_secs.max(0) as u64 * 1000;
    let diff = a_ms.abs_diff(b_ms);
    diff > epsilon_ms
}

/// Decide whether a file should be (re)written, and why (§4.C). Pure and total:
/// every input combination maps to exactly one `(should_update, reason)` pair.
pub fn decide_update(input: DecisionInput) -> (bool, DecisionReason) {
    if !input.local_exists {
        return (true, DecisionReason::New);
    }
    if input.force_update {
        return (true, DecisionReason::Forced);
    }
    if !input.content_equal {
        return (true, DecisionReason::Content);
    }
    let epsilon = if input.mod_time_epsilon_secs <= 0 {
        2
    } else {
        input.mod_time_epsilon_secs
    };
    if mod_time_different(input.remote_mod_time_ms, input.local_mod_time_ms, epsilon) {
        return (true, DecisionReason::ModTime);
    }
    (false, DecisionReason::Unchanged)
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
