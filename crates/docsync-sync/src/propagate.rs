//! Cross-side deletion propagation
//!
//! What vanished on one side since the last run is removed from the other
//! side, both on disk and in that side's current snapshot. Documents go
//! first, then folders deepest-first, so a folder is empty by the time its
//! removal is attempted.
//!
//! A deletion wins over a change made on the other side since the last run.
//! Only an entry whose kind differs on the other side is left in place.

use std::path::Path;

use tracing::{debug, info, warn};

use docsync_core::domain::entry::EntryKind;
use docsync_core::domain::newtypes::EntryPath;
use docsync_core::domain::snapshot::Snapshot;
use docsync_core::domain::sync_state::{DeletionSet, SyncState};
use docsync_core::domain::translate::PathTranslator;
use docsync_core::ports::local_filesystem::ILocalFileSystem;
use docsync_core::ports::remote_store::IRemoteStore;

use crate::report::SyncReport;

/// Deletion order: documents, then folders with children before parents
fn ordered(deletions: &DeletionSet) -> impl Iterator<Item = (&EntryPath, EntryKind)> {
    deletions
        .documents()
        .iter()
        .map(|p| (p, EntryKind::Document))
        .chain(deletions.folders().iter().rev().map(|p| (p, EntryKind::Folder)))
}

/// Outcome of checking a deletion target on the other side
enum Target {
    Delete,
    Absent,
    Keep,
}

fn check_target(snapshot: &Snapshot, path: &EntryPath, kind: EntryKind) -> Target {
    let Some(entry) = snapshot.get_by_path(path) else {
        debug!(path = %path, "Already absent on the other side");
        return Target::Absent;
    };
    if entry.kind() != kind {
        warn!(
            path = %path,
            deleted = %kind,
            present = %entry.kind(),
            "Deleted entry has a different kind on the other side; keeping it"
        );
        return Target::Keep;
    }
    if matches!(snapshot.sync_state(path), Some(SyncState::Modified)) {
        debug!(path = %path, "Deleting a copy modified since the last run");
    }
    Target::Delete
}

/// Applies deletions on both sides of one root pair
pub struct Propagator<'a> {
    translator: &'a PathTranslator,
    local_dir: &'a Path,
    fs: &'a dyn ILocalFileSystem,
    store: &'a dyn IRemoteStore,
}

impl<'a> Propagator<'a> {
    /// Creates a propagator for the pair whose local root lives at
    /// `local_dir`
    pub fn new(
        translator: &'a PathTranslator,
        local_dir: &'a Path,
        fs: &'a dyn ILocalFileSystem,
        store: &'a dyn IRemoteStore,
    ) -> Self {
        Self {
            translator,
            local_dir,
            fs,
            store,
        }
    }

    /// Deletes from the remote store what vanished locally
    ///
    /// `deletions` holds local snapshot paths; `remote` is the current
    /// remote snapshot and loses every node actually deleted.
    pub async fn to_remote(&self, deletions: &DeletionSet, remote: &mut Snapshot, report: &mut SyncReport) {
        for (local_path, kind) in ordered(deletions) {
            let path = match self.translator.local_to_remote(local_path) {
                Ok(path) => path,
                Err(e) => {
                    report.error(format!("Cannot map {local_path} to the remote side: {e}"));
                    continue;
                }
            };
            if !matches!(check_target(remote, &path, kind), Target::Delete) {
                continue;
            }

            let result = match kind {
                EntryKind::Document => self.store.delete_document(&path).await,
                EntryKind::Folder => self.store.delete_folder(&path).await,
            };
            match result {
                Ok(()) => {
                    info!(path = %path, kind = %kind, "Deleted remote entry");
                    if let Err(e) = remote.remove(&path) {
                        report.error(format!("Failed to drop {path} from the remote snapshot: {e}"));
                    }
                    report.deleted_remote += 1;
                }
                Err(e) => report.error(format!("Failed to delete remote {kind} {path}: {e:#}")),
            }
        }
    }

    /// Deletes from the local directory what vanished remotely
    ///
    /// `deletions` holds remote snapshot paths; `local` is the current local
    /// snapshot and loses every node actually deleted.
    pub async fn to_local(&self, deletions: &DeletionSet, local: &mut Snapshot, report: &mut SyncReport) {
        for (remote_path, kind) in ordered(deletions) {
            let mapped = self.translator.remote_to_local(remote_path).and_then(|path| {
                let fs_path = path.to_fs_path(self.translator.local_root(), self.local_dir)?;
                Ok((path, fs_path))
            });
            let (path, fs_path) = match mapped {
                Ok(mapped) => mapped,
                Err(e) => {
                    report.error(format!("Cannot map {remote_path} to the local side: {e}"));
                    continue;
                }
            };
            if !matches!(check_target(local, &path, kind), Target::Delete) {
                continue;
            }

            let result = match kind {
                EntryKind::Document => self.fs.delete_file(&fs_path).await,
                EntryKind::Folder => self.fs.delete_empty_directory(&fs_path).await,
            };
            match result {
                Ok(()) => {
                    info!(path = %fs_path.display(), kind = %kind, "Deleted local entry");
                    if let Err(e) = local.remove(&path) {
                        report.error(format!("Failed to drop {path} from the local snapshot: {e}"));
                    }
                    report.deleted_local += 1;
                }
                Err(e) => report.error(format!(
                    "Failed to delete local {kind} {}: {e:#}",
                    fs_path.display()
                )),
            }
        }
    }
}
