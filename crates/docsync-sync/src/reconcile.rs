//! Path-aligned reconciliation
//!
//! After deletions have been propagated, the two current snapshots are
//! walked against each other:
//!
//! 1. **remote → local**: every remote node under the remote root is looked
//!    up locally. Missing folders are created and missing documents are
//!    downloaded; a document present on both sides with differing size goes
//!    through the conflict classifier.
//! 2. **local → remote**: every local node missing remotely is created
//!    (folder) or uploaded (document).
//!
//! Failures are recorded in the [`SyncReport`] and the walk continues.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use docsync_conflict::{ConflictAction, ConflictClassifier};
use docsync_core::domain::conflict::ConflictSide;
use docsync_core::domain::entry::{Entry, EntryKind};
use docsync_core::domain::newtypes::EntryPath;
use docsync_core::domain::snapshot::Snapshot;
use docsync_core::domain::sync_state::SyncState;
use docsync_core::domain::translate::PathTranslator;
use docsync_core::ports::local_filesystem::ILocalFileSystem;
use docsync_core::ports::remote_store::IRemoteStore;
use docsync_core::ports::transfer::{ITransferAgent, TransferOutcome, TransferPolicy};

use crate::report::SyncReport;

/// Brings both sides of one root pair into agreement
pub struct Reconciler<'a> {
    translator: &'a PathTranslator,
    local_dir: &'a Path,
    fs: &'a dyn ILocalFileSystem,
    store: &'a dyn IRemoteStore,
    transfer: &'a dyn ITransferAgent,
    classifier: &'a ConflictClassifier,
    first_sync: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        translator: &'a PathTranslator,
        local_dir: &'a Path,
        fs: &'a dyn ILocalFileSystem,
        store: &'a dyn IRemoteStore,
        transfer: &'a dyn ITransferAgent,
        classifier: &'a ConflictClassifier,
    ) -> Self {
        Self {
            translator,
            local_dir,
            fs,
            store,
            transfer,
            classifier,
            first_sync: false,
        }
    }

    /// Without a baseline, documents present on both sides are taken from
    /// the remote store instead of being classified
    pub fn first_sync(mut self, first_sync: bool) -> Self {
        self.first_sync = first_sync;
        self
    }

    /// Runs both passes
    pub async fn reconcile(&self, local: &Snapshot, remote: &Snapshot, report: &mut SyncReport) {
        self.remote_to_local(local, remote, report).await;
        self.local_to_remote(local, remote, report).await;
    }

    fn fs_path(&self, local_path: &EntryPath) -> Result<PathBuf, String> {
        local_path
            .to_fs_path(self.translator.local_root(), self.local_dir)
            .map_err(|e| format!("Cannot map {local_path} to a local file: {e}"))
    }

    async fn remote_to_local(&self, local: &Snapshot, remote: &Snapshot, report: &mut SyncReport) {
        let remote_root = self.translator.remote_root();
        for remote_entry in remote.preorder() {
            let remote_path = remote_entry.path();
            if remote_path == remote_root || !self.translator.is_under_remote_root(remote_path) {
                continue;
            }
            let local_path = match self.translator.remote_to_local(remote_path) {
                Ok(path) => path,
                Err(e) => {
                    report.error(format!("Cannot map {remote_path} to the local side: {e}"));
                    continue;
                }
            };
            let target = match self.fs_path(&local_path) {
                Ok(target) => target,
                Err(msg) => {
                    report.error(msg);
                    continue;
                }
            };

            match local.get_by_path(&local_path) {
                Some(local_entry) if local_entry.kind() != remote_entry.kind() => {
                    report.error(format!(
                        "{local_path} is a {} locally but a {} remotely; skipping",
                        local_entry.kind(),
                        remote_entry.kind()
                    ));
                }
                Some(local_entry) if local_entry.is_document() => {
                    if local_entry.size() != remote_entry.size() {
                        self.resolve_difference(local, remote, local_entry, remote_entry, &target, report)
                            .await;
                    }
                }
                Some(_) => {}
                None => match remote_entry.kind() {
                    EntryKind::Folder => match self.fs.create_directory(&target).await {
                        Ok(()) => {
                            info!(path = %target.display(), "Created local folder");
                            report.folders_created_local += 1;
                        }
                        Err(e) => report.error(format!(
                            "Failed to create local folder {}: {e:#}",
                            target.display()
                        )),
                    },
                    EntryKind::Document => {
                        self.download(remote_path, &target, TransferPolicy::RemoteWins, report)
                            .await;
                    }
                },
            }
        }
    }

    async fn local_to_remote(&self, local: &Snapshot, remote: &Snapshot, report: &mut SyncReport) {
        for local_entry in local.preorder().skip(1) {
            let local_path = local_entry.path();
            let remote_path = match self.translator.local_to_remote(local_path) {
                Ok(path) => path,
                Err(e) => {
                    report.error(format!("Cannot map {local_path} to the remote side: {e}"));
                    continue;
                }
            };
            // Present remotely: handled (or reported) by the first pass
            if remote.contains(&remote_path) {
                continue;
            }

            match local_entry.kind() {
                EntryKind::Folder => match self.store.create_folder(&remote_path).await {
                    Ok(()) => {
                        info!(path = %remote_path, "Created remote folder");
                        report.folders_created_remote += 1;
                    }
                    Err(e) => report.error(format!("Failed to create remote folder {remote_path}: {e:#}")),
                },
                EntryKind::Document => match self.fs_path(local_path) {
                    Ok(source) => {
                        self.upload(&source, &remote_path, TransferPolicy::LocalWins, report)
                            .await;
                    }
                    Err(msg) => report.error(msg),
                },
            }
        }
    }

    /// Handles a document present on both sides with differing size
    async fn resolve_difference(
        &self,
        local: &Snapshot,
        remote: &Snapshot,
        local_entry: &Entry,
        remote_entry: &Entry,
        target: &Path,
        report: &mut SyncReport,
    ) {
        let remote_path = remote_entry.path();

        if self.first_sync {
            debug!(path = %remote_path, "No baseline; remote copy wins");
            self.download(remote_path, target, TransferPolicy::RemoteWins, report)
                .await;
            return;
        }

        let side = |snapshot: &Snapshot, entry: &Entry| ConflictSide {
            path: entry.path().clone(),
            state: snapshot.sync_state(entry.path()).unwrap_or(SyncState::New),
            size: entry.size().unwrap_or_default(),
            modified: entry.modified(),
        };
        let verdict = match self
            .classifier
            .decide(side(local, local_entry), side(remote, remote_entry))
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => {
                report.error(format!("Conflict on {remote_path} left unresolved: {e}"));
                report.conflicts_skipped += 1;
                return;
            }
        };
        if verdict.asked {
            report.conflicts_asked += 1;
        }
        if verdict.anomaly {
            report.anomalies += 1;
        }

        match verdict.action {
            ConflictAction::Upload => {
                self.upload(target, remote_path, TransferPolicy::LocalWins, report)
                    .await;
            }
            ConflictAction::Download => {
                self.download(remote_path, target, TransferPolicy::RemoteWins, report)
                    .await;
            }
            ConflictAction::Skip => {
                warn!(path = %remote_path, "Conflict skipped; both copies left as they are");
                report.conflicts_skipped += 1;
            }
        }
    }

    async fn download(&self, remote: &EntryPath, local: &Path, policy: TransferPolicy, report: &mut SyncReport) {
        match self.transfer.download(remote, local, policy).await {
            Ok(TransferOutcome::Transferred) => {
                info!(remote = %remote, local = %local.display(), "Downloaded document");
                report.downloads += 1;
            }
            Ok(TransferOutcome::Skipped) => {
                debug!(remote = %remote, "Download skipped by transfer policy");
            }
            Err(e) => report.error(format!("Failed to download {remote}: {e:#}")),
        }
    }

    async fn upload(&self, local: &Path, remote: &EntryPath, policy: TransferPolicy, report: &mut SyncReport) {
        match self.transfer.upload(local, remote, policy).await {
            Ok(TransferOutcome::Transferred) => {
                info!(local = %local.display(), remote = %remote, "Uploaded document");
                report.uploads += 1;
            }
            Ok(TransferOutcome::Skipped) => {
                debug!(remote = %remote, "Upload skipped by transfer policy");
            }
            Err(e) => report.error(format!("Failed to upload {}: {e:#}", local.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use tempfile::TempDir;

    use docsync_core::domain::conflict::{ConflictContext, Resolution};
    use docsync_core::ports::resolver::IConflictResolver;

    use super::*;
    use crate::diff::diff;
    use crate::filesystem::LocalFileSystemAdapter;
    use crate::store::DirectoryStore;

    struct Scripted {
        answer: Resolution,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl IConflictResolver for Scripted {
        async fn resolve(&self, conflict: &ConflictContext) -> anyhow::Result<Resolution> {
            self.seen.lock().unwrap().push(conflict.reason());
            Ok(self.answer)
        }
    }

    fn p(s: &str) -> EntryPath {
        EntryPath::parse(s).unwrap()
    }

    struct Fixture {
        local_dir: TempDir,
        remote_dir: TempDir,
        translator: PathTranslator,
    }

    impl Fixture {
        fn new() -> Self {
            let remote_dir = TempDir::new().unwrap();
            std::fs::create_dir_all(remote_dir.path().join("Document/Reader")).unwrap();
            Self {
                local_dir: TempDir::new().unwrap(),
                remote_dir,
                translator: PathTranslator::new(p("reader"), p("Document/Reader")),
            }
        }

        fn local_file(&self, rel: &str, data: &[u8]) {
            let path = self.local_dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, data).unwrap();
        }

        fn remote_file(&self, rel: &str, data: &[u8]) {
            let path = self.remote_dir.path().join("Document/Reader").join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, data).unwrap();
        }
    }

    /// Snapshot rooted at the first component of `root`, with every folder
    /// down to `root` present
    fn snapshot(root: &str, entries: &[(&str, Option<u64>)]) -> Snapshot {
        let components = p(root).components().to_vec();
        let mut s = Snapshot::build(Entry::folder(EntryPath::new(components[..1].iter().cloned()).unwrap())).unwrap();
        for depth in 2..=components.len() {
            s.insert(Entry::folder(EntryPath::new(components[..depth].iter().cloned()).unwrap()))
                .unwrap();
        }
        for (path, size) in entries {
            let entry = match size {
                Some(size) => Entry::document(p(path), *size, Utc::now()),
                None => Entry::folder(p(path)),
            };
            s.insert(entry).unwrap();
        }
        s
    }

    async fn run(
        fx: &Fixture,
        local: &Snapshot,
        remote: &Snapshot,
        resolver: Arc<Scripted>,
        first_sync: bool,
    ) -> SyncReport {
        let fs = LocalFileSystemAdapter::new();
        let store = DirectoryStore::new(fx.remote_dir.path());
        let classifier = ConflictClassifier::new(resolver);
        let mut report = SyncReport::new("reader");
        Reconciler::new(&fx.translator, fx.local_dir.path(), &fs, &store, &store, &classifier)
            .first_sync(first_sync)
            .reconcile(local, remote, &mut report)
            .await;
        report
    }

    fn resolver(answer: Resolution) -> Arc<Scripted> {
        Arc::new(Scripted {
            answer,
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_missing_entries_are_copied_both_ways() {
        let fx = Fixture::new();
        fx.remote_file("books/r.pdf", b"remote");
        fx.local_file("notes/l.pdf", b"local");

        let mut local = snapshot("reader", &[("reader/notes", None), ("reader/notes/l.pdf", Some(5))]);
        let mut remote = snapshot(
            "Document/Reader",
            &[("Document/Reader/books", None), ("Document/Reader/books/r.pdf", Some(6))],
        );
        diff(&mut local, None).unwrap();
        diff(&mut remote, None).unwrap();

        let report = run(&fx, &local, &remote, resolver(Resolution::Skip), true).await;

        assert!(report.is_clean(), "{:?}", report.errors);
        assert_eq!(report.folders_created_local, 1);
        assert_eq!(report.downloads, 1);
        assert_eq!(report.folders_created_remote, 1);
        assert_eq!(report.uploads, 1);
        assert_eq!(std::fs::read(fx.local_dir.path().join("books/r.pdf")).unwrap(), b"remote");
        assert_eq!(
            std::fs::read(fx.remote_dir.path().join("Document/Reader/notes/l.pdf")).unwrap(),
            b"local"
        );
    }

    #[tokio::test]
    async fn test_remote_outside_root_is_ignored() {
        let fx = Fixture::new();
        let mut local = snapshot("reader", &[]);
        let mut remote = snapshot("Document/Reader", &[("Document/Other", None)]);
        diff(&mut local, None).unwrap();
        diff(&mut remote, None).unwrap();

        let report = run(&fx, &local, &remote, resolver(Resolution::Skip), true).await;
        assert_eq!(report.changes(), 0);
        assert!(!fx.local_dir.path().join("Other").exists());
    }

    #[tokio::test]
    async fn test_first_sync_remote_wins_without_asking() {
        let fx = Fixture::new();
        fx.local_file("a.pdf", b"local copy");
        fx.remote_file("a.pdf", b"remote");

        let mut local = snapshot("reader", &[("reader/a.pdf", Some(10))]);
        let mut remote = snapshot("Document/Reader", &[("Document/Reader/a.pdf", Some(6))]);
        diff(&mut local, None).unwrap();
        diff(&mut remote, None).unwrap();

        let ask = resolver(Resolution::Local);
        let report = run(&fx, &local, &remote, ask.clone(), true).await;

        assert_eq!(report.downloads, 1);
        assert_eq!(report.conflicts_asked, 0);
        assert!(ask.seen.lock().unwrap().is_empty());
        assert_eq!(std::fs::read(fx.local_dir.path().join("a.pdf")).unwrap(), b"remote");
    }

    #[tokio::test]
    async fn test_local_modification_uploads() {
        let fx = Fixture::new();
        fx.local_file("a.pdf", b"grown larger");
        fx.remote_file("a.pdf", b"small");

        let base_local = snapshot("reader", &[("reader/a.pdf", Some(5))]);
        let base_remote = snapshot("Document/Reader", &[("Document/Reader/a.pdf", Some(5))]);
        let mut local = snapshot("reader", &[("reader/a.pdf", Some(12))]);
        let mut remote = snapshot("Document/Reader", &[("Document/Reader/a.pdf", Some(5))]);
        diff(&mut local, Some(&base_local)).unwrap();
        diff(&mut remote, Some(&base_remote)).unwrap();

        let report = run(&fx, &local, &remote, resolver(Resolution::Skip), false).await;
        assert_eq!(report.uploads, 1);
        assert_eq!(report.conflicts_asked, 0);
        assert_eq!(
            std::fs::read(fx.remote_dir.path().join("Document/Reader/a.pdf")).unwrap(),
            b"grown larger"
        );
    }

    #[tokio::test]
    async fn test_both_modified_asks_resolver() {
        let fx = Fixture::new();
        fx.local_file("a.pdf", b"local edit");
        fx.remote_file("a.pdf", b"remote edit!");

        let base_local = snapshot("reader", &[("reader/a.pdf", Some(5))]);
        let base_remote = snapshot("Document/Reader", &[("Document/Reader/a.pdf", Some(5))]);
        let mut local = snapshot("reader", &[("reader/a.pdf", Some(10))]);
        let mut remote = snapshot("Document/Reader", &[("Document/Reader/a.pdf", Some(12))]);
        diff(&mut local, Some(&base_local)).unwrap();
        diff(&mut remote, Some(&base_remote)).unwrap();

        let ask = resolver(Resolution::Remote);
        let report = run(&fx, &local, &remote, ask.clone(), false).await;

        assert_eq!(ask.seen.lock().unwrap().as_slice(), ["L:modified R:modified"]);
        assert_eq!(report.conflicts_asked, 1);
        assert_eq!(report.anomalies, 0);
        assert_eq!(report.downloads, 1);
        assert_eq!(std::fs::read(fx.local_dir.path().join("a.pdf")).unwrap(), b"remote edit!");
    }

    #[tokio::test]
    async fn test_skip_leaves_both_copies() {
        let fx = Fixture::new();
        fx.local_file("a.pdf", b"local edit");
        fx.remote_file("a.pdf", b"remote edit!");

        let base = snapshot("reader", &[("reader/a.pdf", Some(5))]);
        let base_remote = snapshot("Document/Reader", &[("Document/Reader/a.pdf", Some(10))]);
        // equal/equal with differing sizes is an anomaly
        let mut local = snapshot("reader", &[("reader/a.pdf", Some(5))]);
        let mut remote = snapshot("Document/Reader", &[("Document/Reader/a.pdf", Some(10))]);
        diff(&mut local, Some(&base)).unwrap();
        diff(&mut remote, Some(&base_remote)).unwrap();

        let report = run(&fx, &local, &remote, resolver(Resolution::Skip), false).await;
        assert_eq!(report.conflicts_skipped, 1);
        assert_eq!(report.anomalies, 1);
        assert_eq!(report.changes(), 0);
        assert_eq!(std::fs::read(fx.local_dir.path().join("a.pdf")).unwrap(), b"local edit");
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_reported() {
        let fx = Fixture::new();
        fx.local_file("x/inner.pdf", b"1");
        fx.remote_file("x", b"doc");

        let mut local = snapshot("reader", &[("reader/x", None), ("reader/x/inner.pdf", Some(1))]);
        let mut remote = snapshot("Document/Reader", &[("Document/Reader/x", Some(3))]);
        diff(&mut local, None).unwrap();
        diff(&mut remote, None).unwrap();

        let report = run(&fx, &local, &remote, resolver(Resolution::Skip), true).await;
        assert!(report.errors[0].contains("reader/x is a folder locally"));
        // the upload below the mismatched folder fails remotely
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.uploads, 0);
    }
}
