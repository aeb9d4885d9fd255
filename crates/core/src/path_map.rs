// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output-path mapping (§4.C) and the path-escape invariant it shares with
//! the writer (§4.B).

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathMapError {
    #[error("path escapes target root")]
    PathEscape,
}

/// Lexically normalise a Unix-form path: resolve `.`/`..`, collapse repeated
/// `/`, and strip a leading `/`. Never touches the filesystem.
///
/// A `..` with nothing left to pop is NOT dropped: it is kept as a literal
/// leading `..` segment, so a remote path that tries to climb above its
/// root (e.g. `/../etc/passwd`) survives cleaning as `../etc/passwd`
/// instead of silently collapsing to `etc/passwd`. That keeps the escape
/// visible to [`ensure_under_root`] once the caller joins it onto
/// `target_root`.
pub fn clean_unix_relative(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    let mut leading_dotdots: usize = 0;
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                if stack.pop().is_none() {
                    leading_dotdots += 1;
                }
            }
            other => stack.push(other),
        }
    }
    std::iter::repeat("..")
        .take(leading_dotdots)
        .chain(stack)
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace a file's extension with `.strm` (case-insensitive match of the
/// original extension is irrelevant — the replacement is unconditional and
/// always produces a lowercase `.strm` suffix per §6).
pub fn with_strm_extension(path: &str) -> String {
    let last_slash = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    let filename = &path[last_slash..];
    match filename.rfind('.') {
        Some(dot) if dot > 0 => format!("{}.strm", &path[..last_slash + dot]),
        _ => format!("{}.strm", path),
    }
}

/// Compute the local output path for a remote file (§4.C output-path mapping).
///
/// Steps: normalise the remote path to Unix form, strip the leading `/`,
/// replace the extension with `.strm`, join with `target_root`, and verify
/// the result is strictly under `target_root` once both sides are
/// lexically resolved.
pub fn map_output_path(remote_path: &str, target_root: &Path) -> Result<PathBuf, PathMapError> {
    let cleaned = clean_unix_relative(remote_path);
    let stemmed = with_strm_extension(&cleaned);
    let joined = target_root.join(stemmed);
    ensure_under_root(&joined, target_root)?;
    Ok(joined)
}

/// Verify that `candidate`, once lexically normalised, is strictly under `root`
/// (also normalised). Never touches the filesystem — callers that need to
/// reject symlink escapes should canonicalize first (§4.B).
pub fn ensure_under_root(candidate: &Path, root: &Path) -> Result<(), PathMapError> {
    let normalized_candidate = lexical_normalize(candidate);
    let normalized_root = lexical_normalize(root);
    if normalized_candidate.starts_with(&normalized_root) && normalized_candidate != normalized_root {
        Ok(())
    } else {
        Err(PathMapError::PathEscape)
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[path = "path_map_tests.rs"]
mod tests;
