//! Remote store port (driven/secondary port)
//!
//! This module defines the interface for the remote document namespace: a
//! full listing plus path-addressed folder creation and deletion. Content
//! transfer lives in the separate [`ITransferAgent`](super::ITransferAgent)
//! port.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification.
//! - `RemoteItem` is a port-level DTO, not a domain entity; the tree builder
//!   is responsible for mapping it to a snapshot [`Entry`](crate::domain::Entry).
//! - Listing is always the whole namespace. Stores that cannot list a
//!   subtree cheaply gain nothing from a narrower call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entry::EntryKind;
use crate::domain::newtypes::EntryPath;

/// A single item of a remote namespace listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Full `/`-separated path, e.g. `Document/Reader/a.pdf`
    pub path: String,
    /// Item name (last path component)
    pub name: String,
    /// Folder or document
    pub kind: EntryKind,
    /// Store-specific identifier
    pub id: Option<String>,
    /// Size in bytes (documents only)
    pub size: Option<u64>,
    /// Last modification time, when reported
    pub modified: Option<DateTime<Utc>>,
    /// Creation time, when reported
    pub created: Option<DateTime<Utc>>,
}

/// Port trait for remote namespace operations
///
/// ## Implementation Notes
///
/// - `delete_folder` must refuse non-empty folders; callers rely on the
///   rejection instead of checking emptiness themselves.
/// - `create_folder` is only called when the parent already exists.
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Lists every folder and document in the remote namespace
    async fn list_all(&self) -> anyhow::Result<Vec<RemoteItem>>;

    /// Creates a folder at `path`
    async fn create_folder(&self, path: &EntryPath) -> anyhow::Result<()>;

    /// Deletes the document at `path`
    async fn delete_document(&self, path: &EntryPath) -> anyhow::Result<()>;

    /// Deletes the empty folder at `path`
    ///
    /// # Errors
    /// Returns an error if the folder is not empty or does not exist
    async fn delete_folder(&self, path: &EntryPath) -> anyhow::Result<()>;
}
