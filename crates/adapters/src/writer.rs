// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local output writer (§4.B): reads, writes, and deletes `.strm` files
//! under a fixed local root, enforcing the path-escape invariant on every
//! call rather than trusting callers to have validated it upstream.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum WriterError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Permission bits applied to created directories/files (§4.B).
#[derive(Debug, Clone, Copy)]
pub struct WriterPermissions {
    pub dir_mode: u32,
    pub file_mode: u32,
}

impl Default for WriterPermissions {
    fn default() -> Self {
        Self {
            dir_mode: 0o755,
            file_mode: 0o644,
        }
    }
}

/// Scoped writer over a fixed local root `R` (§4.B). Stateless beyond the
/// root and permission config; every call is self-contained.
pub struct StrmWriter {
    root: PathBuf,
    permissions: WriterPermissions,
}

impl StrmWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            permissions: WriterPermissions::default(),
        }
    }

    pub fn with_permissions(mut self, permissions: WriterPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate `path` is a relative path that resolves under `R` after
    /// lexical normalisation, without touching the filesystem (§4.B
    /// invariant). Symlink traversal is rejected separately, at open time,
    /// by `canonicalize`-comparing the resolved parent directory.
    fn resolve(&self, path: &str) -> Result<PathBuf, WriterError> {
        let rel = Path::new(path);
        if rel.is_absolute() {
            return Err(WriterError::InvalidInput(format!(
                "path must be relative: {path}"
            )));
        }
        let mut normalized = PathBuf::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(WriterError::InvalidInput(format!(
                        "path escapes root: {path}"
                    )));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(WriterError::InvalidInput(format!(
                        "path must be relative: {path}"
                    )));
                }
            }
        }
        Ok(self.root.join(normalized))
    }

    /// Reject the write if the resolved parent directory, once it exists,
    /// canonicalizes outside `R` — catching a symlink planted by something
    /// other than this writer (§4.B).
    async fn check_no_symlink_escape(&self, full: &Path) -> Result<(), WriterError> {
        let Some(parent) = full.parent() else {
            return Ok(());
        };
        if !tokio::fs::try_exists(parent).await.unwrap_or(false) {
            return Ok(());
        }
        let canonical_root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|e| WriterError::Io(e.to_string()))?;
        let canonical_parent = tokio::fs::canonicalize(parent)
            .await
            .map_err(|e| WriterError::Io(e.to_string()))?;
        if !canonical_parent.starts_with(&canonical_root) {
            return Err(WriterError::InvalidInput(format!(
                "path escapes root via symlink: {}",
                full.display()
            )));
        }
        Ok(())
    }

    pub async fn read(&self, path: &str) -> Result<String, WriterError> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| WriterError::Io(format!("{path}: {e}")))
    }

    /// Write `content` to `path`, creating parent directories as needed.
    /// When `mod_time_ms` is non-zero, the resulting file's mtime is set
    /// to it; writes go through a temp-file-then-rename so concurrent
    /// readers never observe a partial file.
    pub async fn write(
        &self,
        path: &str,
        content: &str,
        mod_time_ms: u64,
    ) -> Result<(), WriterError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WriterError::Io(format!("mkdir {}: {e}", parent.display())))?;
            set_dir_permissions(parent, self.permissions.dir_mode);
        }
        self.check_no_symlink_escape(&full).await?;

        let tmp_path = tmp_sibling(&full);
        tokio::fs::write(&tmp_path, content.as_bytes())
            .await
            .map_err(|e| WriterError::Io(format!("write {}: {e}", tmp_path.display())))?;
        set_file_permissions(&tmp_path, self.permissions.file_mode);
        tokio::fs::rename(&tmp_path, &full)
            .await
            .map_err(|e| WriterError::Io(format!("rename into {}: {e}", full.display())))?;

        if mod_time_ms != 0 {
            set_mtime(&full, mod_time_ms)?;
        }
        Ok(())
    }

    /// Idempotent: deleting a file that doesn't exist is success (§4.B).
    pub async fn delete(&self, path: &str) -> Result<(), WriterError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WriterError::Io(format!("delete {}: {e}", full.display()))),
        }
    }

    /// Walk upward from `path`'s parent directory, removing directories
    /// that are now empty, stopping at (and never removing) `R` itself
    /// (§4.C RunIncremental delete handling).
    pub async fn prune_empty_parents(&self, path: &str) -> Result<(), WriterError> {
        let full = self.resolve(path)?;
        let mut dir = match full.parent() {
            Some(p) => p.to_path_buf(),
            None => return Ok(()),
        };
        loop {
            if dir == self.root || !dir.starts_with(&self.root) {
                return Ok(());
            }
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(e) => e,
                Err(_) => return Ok(()),
            };
            let has_entry = entries
                .next_entry()
                .await
                .map_err(|e| WriterError::Io(e.to_string()))?
                .is_some();
            if has_entry {
                return Ok(());
            }
            if tokio::fs::remove_dir(&dir).await.is_err() {
                return Ok(());
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => return Ok(()),
            }
        }
    }
}

fn tmp_sibling(full: &Path) -> PathBuf {
    let file_name = full
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    full.with_file_name(format!(".{file_name}.strmsync-tmp"))
}

fn set_mtime(path: &Path, mod_time_ms: u64) -> Result<(), WriterError> {
    let mtime = filetime::FileTime::from_unix_time(
        (mod_time_ms / 1000) as i64,
        ((mod_time_ms % 1000) * 1_000_000) as u32,
    );
    filetime::set_file_mtime(path, mtime).map_err(|e| WriterError::Io(e.to_string()))
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(path) {
        let mut perms = meta.permissions();
        perms.set_mode(mode);
        let _ = std::fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path, _mode: u32) {}

#[cfg(unix)]
fn set_file_permissions(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(path) {
        let mut perms = meta.permissions();
        perms.set_mode(mode);
        let _ = std::fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path, _mode: u32) {}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
