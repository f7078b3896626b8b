//! Local filesystem port (driven/secondary port)
//!
//! This module defines the interface for the local side of a root pair:
//! a recursive walk reporting folders and documents, plus the few mutating
//! operations the synchronizer performs directly (directory creation and
//! deletions). Document content is written by the transfer port.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - `walk` reports everything below the root; filtering of state files,
//!   hidden entries and extensions is the tree builder's job.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::entry::EntryKind;

/// A single item reported by a local walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalItem {
    /// Absolute path of the item
    pub path: PathBuf,
    /// Path components relative to the walked root
    pub relative: Vec<String>,
    /// Folder or document
    pub kind: EntryKind,
    /// Size in bytes (0 for folders)
    pub size: u64,
    /// Last modification time, when the platform reports one
    pub modified: Option<DateTime<Utc>>,
}

impl LocalItem {
    /// Returns the item's file name
    pub fn name(&self) -> &str {
        self.relative.last().map(String::as_str).unwrap_or_default()
    }
}

/// Port trait for local filesystem operations
///
/// ## Implementation Notes
///
/// - `walk` must report parents before their children.
/// - Symbolic links are not followed and not reported.
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Recursively lists every folder and document below `root`
    ///
    /// The root itself is not reported.
    ///
    /// # Errors
    /// Returns an error if `root` cannot be read
    async fn walk(&self, root: &Path) -> anyhow::Result<Vec<LocalItem>>;

    /// Creates a directory and all parent directories as needed
    async fn create_directory(&self, path: &Path) -> anyhow::Result<()>;

    /// Deletes a single file
    async fn delete_file(&self, path: &Path) -> anyhow::Result<()>;

    /// Deletes an empty directory
    ///
    /// # Errors
    /// Returns an error if the directory is not empty
    async fn delete_empty_directory(&self, path: &Path) -> anyhow::Result<()>;

    /// Returns true if `path` exists (file or directory)
    async fn exists(&self, path: &Path) -> anyhow::Result<bool>;
}
