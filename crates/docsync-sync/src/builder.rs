//! Snapshot builders
//!
//! Turn a raw remote listing or a local walk into a [`Snapshot`]. The remote
//! snapshot covers the whole namespace under its top-level folder; the local
//! snapshot is rooted at the local directory's name.
//!
//! The pair's [`EntryFilter`] scopes both sides: the local walk is filtered
//! while building, and [`prune_remote`] drops the same paths below the
//! remote root.

use glob::Pattern;
use tracing::{debug, warn};

use docsync_core::domain::entry::{Entry, EntryKind};
use docsync_core::domain::errors::DomainError;
use docsync_core::domain::newtypes::{EntryPath, RemoteId};
use docsync_core::domain::snapshot::Snapshot;
use docsync_core::ports::local_filesystem::LocalItem;
use docsync_core::ports::remote_store::RemoteItem;

use crate::SyncError;

// ============================================================================
// Pair filter
// ============================================================================

/// Decides which entries of a root pair take part in synchronization
///
/// Paths are matched relative to the pair's root on either side. Hidden
/// entries (any component starting with `.`) are always dropped, which also
/// keeps the persisted state files out of the snapshots.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    extensions: Vec<String>,
    exclude: Vec<Pattern>,
}

impl EntryFilter {
    /// Creates a filter from document extensions (without the dot, matched
    /// case-insensitively; empty means all) and exclude globs matched
    /// against the path relative to the pair root
    ///
    /// # Errors
    /// Returns `SyncError::InvalidFilter` for an invalid glob
    pub fn new(extensions: &[String], exclude: &[String]) -> Result<Self, SyncError> {
        let exclude = exclude
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| SyncError::InvalidFilter(format!("{p}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude,
        })
    }

    /// Returns true if an entry of `kind` at `relative` (components below
    /// the pair root) takes part in synchronization
    pub fn accepts(&self, kind: EntryKind, relative: &[String]) -> bool {
        if relative.iter().any(|c| c.starts_with('.')) {
            return false;
        }
        let joined = relative.join("/");
        if self.exclude.iter().any(|p| p.matches(&joined)) {
            return false;
        }
        match kind {
            EntryKind::Folder => true,
            EntryKind::Document => {
                if self.extensions.is_empty() {
                    return true;
                }
                let name = relative.last().map(String::as_str).unwrap_or_default();
                match name.rsplit_once('.') {
                    Some((stem, ext)) if !stem.is_empty() => {
                        self.extensions.contains(&ext.to_lowercase())
                    }
                    _ => false,
                }
            }
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Builds the local snapshot rooted at `root` from a walk of the local
/// directory
///
/// Items rejected by the filter are skipped together with everything below
/// them.
pub fn build_local(
    root: &EntryPath,
    items: Vec<LocalItem>,
    filter: &EntryFilter,
) -> Result<Snapshot, SyncError> {
    let mut snapshot = Snapshot::build(Entry::folder(root.clone()))?;

    for item in items {
        if !filter.accepts(item.kind, &item.relative) {
            debug!(path = %item.path.display(), "Skipping filtered local item");
            continue;
        }
        let path = match EntryPath::new(root.components().iter().chain(item.relative.iter()).cloned()) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %item.path.display(), error = %e, "Skipping local item with invalid name");
                continue;
            }
        };
        let entry = match item.kind {
            EntryKind::Folder => Entry::folder(path),
            EntryKind::Document => {
                Entry::document(path, item.size, item.modified.unwrap_or_default())
            }
        };
        match snapshot.insert(entry) {
            Ok(_) => {}
            Err(DomainError::MissingParent(p)) => {
                debug!(path = %p, "Skipping local item below a filtered folder");
            }
            Err(e) => return Err(e.into()),
        }
    }

    debug!(root = %root, entries = snapshot.len(), "Built local snapshot");
    Ok(snapshot)
}

/// Builds the remote snapshot of the namespace rooted at `namespace_root`
/// (e.g. `Document`) from a flat listing
///
/// Listing items outside the namespace root are ignored, items with an
/// unparseable path are skipped, and folders missing from the listing are
/// synthesized so every item has a parent.
///
/// # Errors
/// Returns `SyncError::InvalidListing` for a document without a size, or
/// an item that is a document in one place and a parent folder in another
pub fn build_remote(namespace_root: &EntryPath, items: Vec<RemoteItem>) -> Result<Snapshot, SyncError> {
    let mut parsed: Vec<(EntryPath, RemoteItem)> = Vec::with_capacity(items.len());
    for item in items {
        match EntryPath::parse(&item.path) {
            Ok(path) if path.starts_with(namespace_root) && &path != namespace_root => {
                parsed.push((path, item));
            }
            Ok(path) if &path == namespace_root => {}
            Ok(path) => debug!(path = %path, "Ignoring remote item outside the namespace root"),
            Err(e) => warn!(path = %item.path, error = %e, "Skipping remote item with invalid path"),
        }
    }
    // Listings are not guaranteed to be parent-first
    parsed.sort_by_key(|(path, _)| path.depth());

    let mut snapshot = Snapshot::build(Entry::folder(namespace_root.clone()))?;
    for (path, item) in parsed {
        if snapshot.contains(&path) {
            warn!(path = %path, "Skipping duplicate remote item");
            continue;
        }
        ensure_parents(&mut snapshot, &path)?;

        let mut entry = match item.kind {
            EntryKind::Folder => Entry::folder(path.clone()),
            EntryKind::Document => {
                let size = item.size.ok_or_else(|| {
                    SyncError::InvalidListing(format!("document {path} has no size"))
                })?;
                let modified = item.modified.or(item.created).unwrap_or_default();
                Entry::document(path.clone(), size, modified)
            }
        };
        if let Some(created) = item.created {
            entry = entry.with_created(created);
        }
        if let Some(id) = item.id.and_then(|id| RemoteId::new(id).ok()) {
            entry = entry.with_remote_id(id);
        }
        snapshot.insert(entry).map_err(|e| match e {
            DomainError::NotAFolder(p) => {
                SyncError::InvalidListing(format!("{p} is a document but has children"))
            }
            other => other.into(),
        })?;
    }

    debug!(root = %namespace_root, entries = snapshot.len(), "Built remote snapshot");
    Ok(snapshot)
}

/// Removes the entries below `remote_root` that `filter` rejects, together
/// with everything under them
///
/// Returns the number of entries removed. Entries outside the remote root
/// are left alone.
pub fn prune_remote(snapshot: &mut Snapshot, remote_root: &EntryPath, filter: &EntryFilter) -> usize {
    let rejected: Vec<EntryPath> = snapshot
        .preorder()
        .filter(|entry| {
            entry
                .path()
                .strip_prefix(remote_root)
                .is_some_and(|relative| !relative.is_empty() && !filter.accepts(entry.kind(), relative))
        })
        .map(|entry| entry.path().clone())
        .collect();

    let mut removed = 0;
    for path in rejected {
        // A rejected folder takes its rejected descendants with it
        match snapshot.remove(&path) {
            Ok(0) => {}
            Ok(n) => {
                debug!(path = %path, entries = n, "Skipping filtered remote entry");
                removed += n;
            }
            Err(e) => warn!(path = %path, error = %e, "Cannot drop filtered remote entry"),
        }
    }
    removed
}

fn ensure_parents(snapshot: &mut Snapshot, path: &EntryPath) -> Result<(), SyncError> {
    let mut missing = Vec::new();
    let mut current = path.parent();
    while let Some(parent) = current {
        if snapshot.contains(&parent) {
            break;
        }
        current = parent.parent();
        missing.push(parent);
    }
    for folder in missing.into_iter().rev() {
        debug!(path = %folder, "Synthesizing remote folder missing from listing");
        snapshot.insert(Entry::folder(folder))?;
    }
    Ok(())
}
