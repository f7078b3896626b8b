//! Per-side diff against the persisted snapshot
//!
//! Assigns a [`SyncState`] to every node of the current snapshot and
//! collects the paths that disappeared since the last run.

use tracing::{debug, warn};

use docsync_core::domain::snapshot::Snapshot;
use docsync_core::domain::sync_state::{DeletionSet, SyncState};

use crate::SyncError;

/// Classifies `current` against `persisted` and returns the deletion set
///
/// Without a persisted snapshot every current node is `new` and nothing is
/// deleted. A path whose kind changed is recorded as a deletion of the old
/// kind and classified `new` in the current tree.
pub fn diff(current: &mut Snapshot, persisted: Option<&Snapshot>) -> Result<DeletionSet, SyncError> {
    let mut deletions = DeletionSet::new();

    match persisted {
        None => {
            warn!(
                root = %current.root_path(),
                "No persisted snapshot; treating every entry as new"
            );
        }
        Some(persisted) => {
            for previous in persisted.preorder() {
                let state = current
                    .get_by_path(previous.path())
                    .and_then(|now| SyncState::classify(previous, now));
                match state {
                    Some(state) => current.set_sync_state(previous.path(), state)?,
                    None => deletions.record(previous.path().clone(), previous.kind()),
                }
            }
        }
    }

    let unclassified: Vec<_> = current
        .preorder()
        .filter(|e| current.sync_state(e.path()).is_none())
        .map(|e| e.path().clone())
        .collect();
    for path in &unclassified {
        current.set_sync_state(path, SyncState::New)?;
    }

    debug!(
        root = %current.root_path(),
        new = unclassified.len(),
        deleted_documents = deletions.documents().len(),
        deleted_folders = deletions.folders().len(),
        "Diff complete"
    );
    Ok(deletions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use docsync_core::domain::entry::Entry;
    use docsync_core::domain::newtypes::EntryPath;

    fn p(s: &str) -> EntryPath {
        EntryPath::parse(s).unwrap()
    }

    fn tree(entries: &[(&str, Option<u64>)]) -> Snapshot {
        let mut s = Snapshot::build(Entry::folder(p("reader"))).unwrap();
        for (path, size) in entries {
            let entry = match size {
                Some(size) => Entry::document(p(path), *size, Utc::now()),
                None => Entry::folder(p(path)),
            };
            s.insert(entry).unwrap();
        }
        s
    }

    #[test]
    fn test_first_sync_marks_everything_new() {
        let mut current = tree(&[("reader/a.pdf", Some(1)), ("reader/b", None)]);
        let deletions = diff(&mut current, None).unwrap();
        assert!(deletions.is_empty());
        for entry in current.preorder() {
            assert_eq!(current.sync_state(entry.path()), Some(SyncState::New));
        }
    }

    #[test]
    fn test_classification_and_deletions() {
        let persisted = tree(&[
            ("reader/same.pdf", Some(100)),
            ("reader/grown.pdf", Some(100)),
            ("reader/gone.pdf", Some(5)),
            ("reader/old", None),
            ("reader/old/inner.pdf", Some(7)),
            ("reader/kept", None),
        ]);
        let mut current = tree(&[
            ("reader/same.pdf", Some(100)),
            ("reader/grown.pdf", Some(150)),
            ("reader/kept", None),
            ("reader/fresh.pdf", Some(3)),
        ]);

        let deletions = diff(&mut current, Some(&persisted)).unwrap();

        assert_eq!(current.sync_state(&p("reader/same.pdf")), Some(SyncState::Equal));
        assert_eq!(current.sync_state(&p("reader/grown.pdf")), Some(SyncState::Modified));
        assert_eq!(current.sync_state(&p("reader/kept")), Some(SyncState::Equal));
        assert_eq!(current.sync_state(&p("reader/fresh.pdf")), Some(SyncState::New));
        assert_eq!(current.sync_state(&p("reader")), Some(SyncState::Equal));

        assert_eq!(
            deletions.documents(),
            &[p("reader/gone.pdf"), p("reader/old/inner.pdf")]
        );
        assert_eq!(deletions.folders(), &[p("reader/old")]);
    }

    #[test]
    fn test_timestamps_do_not_matter() {
        let mut persisted = Snapshot::build(Entry::folder(p("reader"))).unwrap();
        persisted
            .insert(Entry::document(p("reader/a.pdf"), 10, Utc::now() - Duration::days(9)))
            .unwrap();
        let mut current = tree(&[("reader/a.pdf", Some(10))]);
        diff(&mut current, Some(&persisted)).unwrap();
        assert_eq!(current.sync_state(&p("reader/a.pdf")), Some(SyncState::Equal));
    }

    #[test]
    fn test_kind_change_is_delete_plus_new() {
        let persisted = tree(&[("reader/x", None), ("reader/x/y.pdf", Some(1))]);
        let mut current = tree(&[("reader/x", Some(4))]);

        let deletions = diff(&mut current, Some(&persisted)).unwrap();
        assert_eq!(deletions.folders(), &[p("reader/x")]);
        assert_eq!(deletions.documents(), &[p("reader/x/y.pdf")]);
        assert_eq!(current.sync_state(&p("reader/x")), Some(SyncState::New));
    }

    #[test]
    fn test_deletion_buckets_partition_missing_paths() {
        let persisted = tree(&[
            ("reader/a", None),
            ("reader/a/b", None),
            ("reader/a/b/c.pdf", Some(1)),
            ("reader/d.pdf", Some(2)),
        ]);
        let mut current = tree(&[]);
        let deletions = diff(&mut current, Some(&persisted)).unwrap();

        assert_eq!(deletions.len(), 4);
        for entry in persisted.preorder().skip(1) {
            let in_docs = deletions.documents().contains(entry.path());
            let in_folders = deletions.folders().contains(entry.path());
            assert!(in_docs != in_folders, "{} must be in exactly one bucket", entry.path());
            assert_eq!(in_docs, entry.is_document());
        }
    }
}
