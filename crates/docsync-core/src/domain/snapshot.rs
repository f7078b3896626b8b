//! Snapshot tree
//!
//! A [`Snapshot`] is a rooted tree of [`Entry`] values for one side of a
//! root pair. Nodes live in an arena; each node owns the list of its
//! children's ids, and the parent id is kept only to detach a node on
//! removal. A path index gives constant-time lookup by [`EntryPath`].
//!
//! ## Serialized form
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": [
//!     { "path": "Document", "kind": "folder" },
//!     { "path": "Document/a.pdf", "kind": "document", "size": 100,
//!       "modified": "2018-10-06T07:38:12.123456789Z" }
//!   ]
//! }
//! ```
//!
//! Entries are written in pre-order, so every parent precedes its children
//! and a snapshot can be rebuilt by inserting records in file order.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::entry::{Entry, EntryKind};
use super::errors::DomainError;
use super::newtypes::{EntryPath, RemoteId};
use super::sync_state::SyncState;

/// Current version of the serialized snapshot format
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Index of a node within a snapshot arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    entry: Entry,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    state: Option<SyncState>,
}

/// Rooted tree of entries for one side
#[derive(Debug, Clone)]
pub struct Snapshot {
    nodes: Vec<Option<Node>>,
    index: HashMap<EntryPath, NodeId>,
    root: NodeId,
}

impl Snapshot {
    /// Builds a snapshot holding only the given root folder
    ///
    /// # Errors
    /// Returns `DomainError::NotAFolder` if `root` is a document
    pub fn build(root: Entry) -> Result<Self, DomainError> {
        if !root.is_folder() {
            return Err(DomainError::NotAFolder(root.path().to_string()));
        }
        let root_id = NodeId(0);
        let mut index = HashMap::new();
        index.insert(root.path().clone(), root_id);
        Ok(Self {
            nodes: vec![Some(Node {
                entry: root,
                parent: None,
                children: Vec::new(),
                state: None,
            })],
            index,
            root: root_id,
        })
    }

    /// Returns the root entry
    pub fn root(&self) -> &Entry {
        // The root slot is never vacated: `remove` refuses the root
        match self.node(self.root) {
            Some(node) => &node.entry,
            None => unreachable!("snapshot root removed"),
        }
    }

    /// Returns the root path
    pub fn root_path(&self) -> &EntryPath {
        self.root().path()
    }

    /// Number of entries in the tree, root included
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Always false; a snapshot holds at least its root
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Attaches `entry` under its parent, which must already be present
    ///
    /// # Errors
    /// - `DuplicateEntry` if the path is already present
    /// - `MissingParent` if the parent path is absent
    /// - `NotAFolder` if the parent is a document
    pub fn insert(&mut self, entry: Entry) -> Result<NodeId, DomainError> {
        let path = entry.path().clone();
        if self.index.contains_key(&path) {
            return Err(DomainError::DuplicateEntry(path.to_string()));
        }
        let parent_path = path
            .parent()
            .ok_or_else(|| DomainError::MissingParent(path.to_string()))?;
        let parent_id = *self
            .index
            .get(&parent_path)
            .ok_or_else(|| DomainError::MissingParent(path.to_string()))?;
        let id = NodeId(self.nodes.len());
        let parent = self
            .node_mut(parent_id)
            .ok_or_else(|| DomainError::MissingParent(path.to_string()))?;
        if !parent.entry.is_folder() {
            return Err(DomainError::NotAFolder(parent_path.to_string()));
        }
        parent.children.push(id);
        self.nodes.push(Some(Node {
            entry,
            parent: Some(parent_id),
            children: Vec::new(),
            state: None,
        }));
        self.index.insert(path, id);
        Ok(id)
    }

    /// Looks up an entry by path; absence is a normal outcome
    pub fn get_by_path(&self, path: &EntryPath) -> Option<&Entry> {
        self.index
            .get(path)
            .and_then(|id| self.node(*id))
            .map(|n| &n.entry)
    }

    /// Returns true if `path` is present
    pub fn contains(&self, path: &EntryPath) -> bool {
        self.index.contains_key(path)
    }

    /// Detaches the node at `path` and its whole subtree
    ///
    /// Returns the number of entries removed (0 if the path was absent).
    ///
    /// # Errors
    /// Returns `DomainError::RootRemoval` when asked to remove the root
    pub fn remove(&mut self, path: &EntryPath) -> Result<usize, DomainError> {
        let Some(&id) = self.index.get(path) else {
            return Ok(0);
        };
        if id == self.root {
            return Err(DomainError::RootRemoval(path.to_string()));
        }

        if let Some(parent_id) = self.node(id).and_then(|n| n.parent) {
            if let Some(parent) = self.node_mut(parent_id) {
                parent.children.retain(|c| *c != id);
            }
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes[current.0].take() {
                self.index.remove(node.entry.path());
                stack.extend(node.children);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Lazy pre-order traversal of all entries, root first
    ///
    /// Each call starts a fresh traversal.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            snapshot: self,
            stack: vec![self.root],
        }
    }

    /// Returns the sync state assigned to `path` in this run, if any
    pub fn sync_state(&self, path: &EntryPath) -> Option<SyncState> {
        self.index
            .get(path)
            .and_then(|id| self.node(*id))
            .and_then(|n| n.state)
    }

    /// Assigns the sync state of `path`
    ///
    /// # Errors
    /// - `ValidationFailed` if the node already has a state for this run
    /// - `InvalidPath` if the path is absent
    pub fn set_sync_state(&mut self, path: &EntryPath, state: SyncState) -> Result<(), DomainError> {
        let id = *self
            .index
            .get(path)
            .ok_or_else(|| DomainError::InvalidPath(format!("{path} is not in the snapshot")))?;
        let node = self
            .node_mut(id)
            .ok_or_else(|| DomainError::InvalidPath(format!("{path} is not in the snapshot")))?;
        if let Some(existing) = node.state {
            return Err(DomainError::ValidationFailed(format!(
                "{path} already classified as {existing}"
            )));
        }
        node.state = Some(state);
        Ok(())
    }

    /// Extracts a detached copy of the subtree rooted at `path`
    ///
    /// Entry paths are kept as they are; the returned snapshot's root path
    /// is `path`. Sync states are not copied.
    ///
    /// # Errors
    /// - `PathNotInSyncRoot` if the path is absent
    /// - `NotAFolder` if it names a document
    pub fn subtree(&self, path: &EntryPath) -> Result<Snapshot, DomainError> {
        let root = self
            .get_by_path(path)
            .ok_or_else(|| DomainError::PathNotInSyncRoot(path.to_string()))?;
        let mut sub = Snapshot::build(root.clone())?;
        for entry in self.preorder().filter(|e| e.path().starts_with(path) && e.path() != path) {
            sub.insert(entry.clone())?;
        }
        Ok(sub)
    }

    /// Serializes the tree to its JSON record form
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSnapshot` if encoding fails
    pub fn serialize(&self) -> Result<String, DomainError> {
        let record = SnapshotRecord {
            version: SNAPSHOT_FORMAT_VERSION,
            entries: self.preorder().map(EntryRecord::from).collect(),
        };
        serde_json::to_string_pretty(&record)
            .map_err(|e| DomainError::InvalidSnapshot(e.to_string()))
    }

    /// Rebuilds a snapshot from its JSON record form
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSnapshot` for malformed JSON, an
    /// unsupported version, an empty record list, a non-folder root, or any
    /// structural violation (duplicate path, record before its parent)
    pub fn deserialize(data: &str) -> Result<Snapshot, DomainError> {
        let record: SnapshotRecord =
            serde_json::from_str(data).map_err(|e| DomainError::InvalidSnapshot(e.to_string()))?;
        if record.version != SNAPSHOT_FORMAT_VERSION {
            return Err(DomainError::InvalidSnapshot(format!(
                "unsupported format version {} (expected {})",
                record.version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        let mut entries = record.entries.into_iter();
        let root = entries
            .next()
            .ok_or_else(|| DomainError::InvalidSnapshot("no root entry".to_string()))?
            .into_entry()?;
        let mut snapshot = Snapshot::build(root)
            .map_err(|e| DomainError::InvalidSnapshot(e.to_string()))?;
        for rec in entries {
            let entry = rec.into_entry()?;
            snapshot
                .insert(entry)
                .map_err(|e| DomainError::InvalidSnapshot(e.to_string()))?;
        }
        Ok(snapshot)
    }

    /// Renders the tree as indented text with human-readable sizes
    pub fn render(&self) -> String {
        let base = self.root_path().depth();
        let mut out = String::new();
        for entry in self.preorder() {
            let indent = "    ".repeat(entry.path().depth() - base);
            match entry.size() {
                Some(size) => {
                    out.push_str(&format!("{indent}{} ({})\n", entry.name(), human_size(size)))
                }
                None => out.push_str(&format!("{indent}{}/\n", entry.name())),
            }
        }
        out
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }
}

/// Pre-order iterator over a snapshot's entries
pub struct Preorder<'a> {
    snapshot: &'a Snapshot,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.snapshot.node(id) {
                self.stack.extend(node.children.iter().rev());
                return Some(&node.entry);
            }
        }
        None
    }
}

/// Formats a byte count with binary units, e.g. `1.5KiB`
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}B")
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

// ============================================================================
// Serialized records
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    version: u32,
    entries: Vec<EntryRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryRecord {
    path: EntryPath,
    kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rfc3339_nanos"
    )]
    modified: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rfc3339_nanos"
    )]
    created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RemoteId>,
}

impl From<&Entry> for EntryRecord {
    fn from(entry: &Entry) -> Self {
        Self {
            path: entry.path().clone(),
            kind: entry.kind(),
            size: entry.size(),
            modified: entry.modified(),
            created: entry.created(),
            id: entry.remote_id().cloned(),
        }
    }
}

impl EntryRecord {
    fn into_entry(self) -> Result<Entry, DomainError> {
        let mut entry = Entry::from_parts(self.path, self.kind, self.size, self.modified)?;
        if let Some(created) = self.created {
            entry = entry.with_created(created);
        }
        if let Some(id) = self.id {
            entry = entry.with_remote_id(id);
        }
        Ok(entry)
    }
}

/// Timestamps are always written with nine fractional digits so that a
/// reload compares equal to what was saved
mod rfc3339_nanos {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
