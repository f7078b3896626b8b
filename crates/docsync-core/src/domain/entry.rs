//! Snapshot entries
//!
//! An [`Entry`] is a single folder or document node in a snapshot. Entries
//! are immutable once built; the only per-run mutable data (the sync state)
//! lives on the snapshot node that owns the entry.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{EntryPath, RemoteId};

/// Kind of a snapshot entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A folder (directory); carries no size
    Folder,
    /// A document (file) with a size and a modification time
    Document,
}

impl EntryKind {
    /// Returns the kind name as a string
    pub fn name(&self) -> &'static str {
        match self {
            EntryKind::Folder => "folder",
            EntryKind::Document => "document",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A folder or document within a snapshot
///
/// Identity for merge purposes is `(path, size)`; timestamps, ids and
/// creation dates are carried along but never compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    path: EntryPath,
    kind: EntryKind,
    size: Option<u64>,
    modified: Option<DateTime<Utc>>,
    created: Option<DateTime<Utc>>,
    remote_id: Option<RemoteId>,
}

impl Entry {
    /// Creates a folder entry
    pub fn folder(path: EntryPath) -> Self {
        Self {
            path,
            kind: EntryKind::Folder,
            size: None,
            modified: None,
            created: None,
            remote_id: None,
        }
    }

    /// Creates a document entry with its size and last-modified time
    pub fn document(path: EntryPath, size: u64, modified: DateTime<Utc>) -> Self {
        Self {
            path,
            kind: EntryKind::Document,
            size: Some(size),
            modified: Some(modified),
            created: None,
            remote_id: None,
        }
    }

    /// Reassembles an entry from its stored parts
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSnapshot` if a document lacks its size or
    /// modification time, or a folder carries a size
    pub fn from_parts(
        path: EntryPath,
        kind: EntryKind,
        size: Option<u64>,
        modified: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        match kind {
            EntryKind::Folder => {
                if size.is_some() {
                    return Err(DomainError::InvalidSnapshot(format!(
                        "folder {path} carries a size"
                    )));
                }
                let mut entry = Self::folder(path);
                entry.modified = modified;
                Ok(entry)
            }
            EntryKind::Document => match (size, modified) {
                (Some(size), Some(modified)) => Ok(Self::document(path, size, modified)),
                _ => Err(DomainError::InvalidSnapshot(format!(
                    "document {path} is missing its size or modification time"
                ))),
            },
        }
    }

    /// Sets the creation time reported by the store
    #[must_use]
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Sets the remote store's identifier for this entry
    #[must_use]
    pub fn with_remote_id(mut self, id: RemoteId) -> Self {
        self.remote_id = Some(id);
        self
    }

    /// Returns the entry path
    pub fn path(&self) -> &EntryPath {
        &self.path
    }

    /// Returns the entry name (last path component)
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Returns the entry kind
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns true if this entry is a folder
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// Returns true if this entry is a document
    pub fn is_document(&self) -> bool {
        self.kind == EntryKind::Document
    }

    /// Size in bytes (documents only)
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Last modification time (always present for documents)
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Creation time, when the store reports one
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Remote store identifier, when known
    pub fn remote_id(&self) -> Option<&RemoteId> {
        self.remote_id.as_ref()
    }
}
