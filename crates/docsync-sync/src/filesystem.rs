//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Parent-first walk**: directories are listed with an explicit stack, so
//!   every folder is reported before anything inside it and deep trees do
//!   not recurse.
//! - **Deterministic order**: entries of each directory are sorted by name.
//! - **No symlinks**: symbolic links are neither followed nor reported.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use docsync_core::domain::entry::EntryKind;
use docsync_core::ports::local_filesystem::{ILocalFileSystem, LocalItem};

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// This is a zero-sized struct because all operations derive their context
/// from the path arguments. Configuration (e.g. the local root) lives at a
/// higher layer.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Converts a filesystem timestamp to UTC, keeping nanoseconds.
pub(crate) fn to_utc(time: SystemTime) -> Option<DateTime<Utc>> {
    time.duration_since(std::time::UNIX_EPOCH)
        .ok()
        .and_then(|dur| DateTime::from_timestamp(dur.as_secs() as i64, dur.subsec_nanos()))
}

/// Walks `root` parent-first, reporting every folder and regular file.
pub(crate) async fn walk_tree(root: &Path) -> anyhow::Result<Vec<LocalItem>> {
    let mut items = Vec::new();
    let mut pending: Vec<(PathBuf, Vec<String>)> = vec![(root.to_path_buf(), Vec::new())];

    while let Some((dir, prefix)) = pending.pop() {
        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

        let mut children = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            children.push(entry);
        }
        children.sort_by_key(|e| e.file_name());

        let mut subdirs = Vec::new();
        for entry in children {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!(name = ?raw, "Skipping entry with non UTF-8 name");
                    continue;
                }
            };
            let metadata = entry.metadata().await?;
            let file_type = metadata.file_type();
            if file_type.is_symlink() {
                continue;
            }

            let mut relative = prefix.clone();
            relative.push(name);
            let kind = if file_type.is_dir() {
                EntryKind::Folder
            } else if file_type.is_file() {
                EntryKind::Document
            } else {
                continue;
            };

            if kind == EntryKind::Folder {
                subdirs.push((entry.path(), relative.clone()));
            }
            items.push(LocalItem {
                path: entry.path(),
                relative,
                kind,
                size: if kind == EntryKind::Document { metadata.len() } else { 0 },
                modified: metadata.modified().ok().and_then(to_utc),
            });
        }
        // Reverse so the stack pops subdirectories in name order
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(items)
}

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(root = %root.display()))]
    async fn walk(&self, root: &Path) -> anyhow::Result<Vec<LocalItem>> {
        let items = walk_tree(root).await?;
        debug!(items = items.len(), "walk complete");
        Ok(items)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn create_directory(&self, path: &Path) -> anyhow::Result<()> {
        debug!("creating directory");
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn delete_file(&self, path: &Path) -> anyhow::Result<()> {
        debug!("removing file");
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to delete file {}", path.display()))?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn delete_empty_directory(&self, path: &Path) -> anyhow::Result<()> {
        debug!("removing empty directory");
        tokio::fs::remove_dir(path)
            .await
            .with_context(|| format!("Failed to delete directory {}", path.display()))?;
        Ok(())
    }

    async fn exists(&self, path: &Path) -> anyhow::Result<bool> {
        match tokio::fs::symlink_metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================
