//! Per-run sync classification
//!
//! [`SyncState`] classifies a current entry against the persisted baseline
//! of the same side; [`DeletionSet`] collects baseline paths that vanished.
//! Both are runtime-only artifacts and are never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entry::{Entry, EntryKind};
use super::newtypes::EntryPath;

/// Classification of a current entry relative to the persisted snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Absent from the persisted snapshot
    New,
    /// Present in both; same size for documents, always for folders
    Equal,
    /// Document present in both with a different size
    Modified,
}

impl SyncState {
    /// Compares a persisted entry with the current entry at the same path
    ///
    /// Returns `None` when the kind changed: a folder that became a document
    /// (or the reverse) is a deletion plus a creation, never a match.
    /// Timestamps are ignored; size is the only equality oracle.
    pub fn classify(previous: &Entry, current: &Entry) -> Option<SyncState> {
        if previous.kind() != current.kind() {
            return None;
        }
        match current.kind() {
            EntryKind::Folder => Some(SyncState::Equal),
            EntryKind::Document => {
                if previous.size() == current.size() {
                    Some(SyncState::Equal)
                } else {
                    Some(SyncState::Modified)
                }
            }
        }
    }

    /// Returns the state name as a string
    pub fn name(&self) -> &'static str {
        match self {
            SyncState::New => "new",
            SyncState::Equal => "equal",
            SyncState::Modified => "modified",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Paths present in a persisted snapshot but absent from the current one
///
/// A path lands in exactly one bucket, chosen by the kind it had in the
/// persisted snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionSet {
    documents: Vec<EntryPath>,
    folders: Vec<EntryPath>,
}

impl DeletionSet {
    /// Creates an empty deletion set
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a deleted path under the bucket matching its old kind
    pub fn record(&mut self, path: EntryPath, kind: EntryKind) {
        match kind {
            EntryKind::Document => self.documents.push(path),
            EntryKind::Folder => self.folders.push(path),
        }
    }

    /// Deleted documents, in persisted pre-order
    pub fn documents(&self) -> &[EntryPath] {
        &self.documents
    }

    /// Deleted folders, in persisted pre-order (parents before children)
    pub fn folders(&self) -> &[EntryPath] {
        &self.folders
    }

    /// Returns true if nothing was deleted
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.folders.is_empty()
    }

    /// Total number of deleted paths
    pub fn len(&self) -> usize {
        self.documents.len() + self.folders.len()
    }

    /// Returns true if `path` is recorded in either bucket
    pub fn contains(&self, path: &EntryPath) -> bool {
        self.documents.contains(path) || self.folders.contains(path)
    }
}
