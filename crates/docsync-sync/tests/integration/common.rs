//! Shared fixtures for sync pass tests
//!
//! A [`Fixture`] owns a local directory named `reader` and a remote store
//! directory holding `Document/Reader`. Conflicts are answered by a
//! [`ScriptedResolver`] that records every question it is asked, and
//! [`FailingTransfer`] rejects transfers of chosen documents.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use docsync_core::domain::conflict::{ConflictContext, Resolution};
use docsync_core::domain::newtypes::EntryPath;
use docsync_core::ports::resolver::IConflictResolver;
use docsync_core::ports::transfer::{ITransferAgent, TransferOutcome, TransferPolicy};
use docsync_sync::engine::{Synchronizer, SynchronizerConfig};
use docsync_sync::filesystem::LocalFileSystemAdapter;
use docsync_sync::report::SyncReport;
use docsync_sync::store::DirectoryStore;

/// Answers conflicts from a queue, falling back to `Skip` when empty
#[derive(Default)]
pub struct ScriptedResolver {
    answers: Mutex<VecDeque<Resolution>>,
    asked: Mutex<Vec<ConflictContext>>,
}

impl ScriptedResolver {
    pub fn answering(answers: &[Resolution]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: Mutex::new(Vec::new()),
        })
    }

    pub fn asked(&self) -> Vec<ConflictContext> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IConflictResolver for ScriptedResolver {
    async fn resolve(&self, conflict: &ConflictContext) -> anyhow::Result<Resolution> {
        self.asked.lock().unwrap().push(conflict.clone());
        Ok(self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Resolution::Skip))
    }
}

/// Delegates to a [`DirectoryStore`] but fails every transfer of a
/// document whose name is listed
pub struct FailingTransfer {
    inner: DirectoryStore,
    names: Vec<String>,
}

impl FailingTransfer {
    pub fn new(remote_base: &Path, names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            inner: DirectoryStore::new(remote_base),
            names: names.iter().map(|n| n.to_string()).collect(),
        })
    }

    fn check(&self, name: &str) -> anyhow::Result<()> {
        if self.names.iter().any(|n| n == name) {
            anyhow::bail!("device rejected {name}");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ITransferAgent for FailingTransfer {
    async fn upload(
        &self,
        local: &Path,
        remote: &EntryPath,
        policy: TransferPolicy,
    ) -> anyhow::Result<TransferOutcome> {
        self.check(remote.name())?;
        self.inner.upload(local, remote, policy).await
    }

    async fn download(
        &self,
        remote: &EntryPath,
        local: &Path,
        policy: TransferPolicy,
    ) -> anyhow::Result<TransferOutcome> {
        self.check(remote.name())?;
        self.inner.download(remote, local, policy).await
    }
}

pub struct Fixture {
    _local_base: TempDir,
    remote_base: TempDir,
    pub local_dir: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let local_base = TempDir::new().unwrap();
        let remote_base = TempDir::new().unwrap();
        let local_dir = local_base.path().join("reader");
        std::fs::create_dir(&local_dir).unwrap();
        std::fs::create_dir_all(remote_base.path().join("Document/Reader")).unwrap();
        Self {
            _local_base: local_base,
            remote_base,
            local_dir,
        }
    }

    pub fn remote_root(&self) -> PathBuf {
        self.remote_base.path().join("Document/Reader")
    }

    pub fn remote_base(&self) -> &Path {
        self.remote_base.path()
    }

    pub fn write_local(&self, rel: &str, data: &[u8]) {
        write(&self.local_dir.join(rel), data);
    }

    pub fn write_remote(&self, rel: &str, data: &[u8]) {
        write(&self.remote_root().join(rel), data);
    }

    pub fn read_local(&self, rel: &str) -> Option<Vec<u8>> {
        std::fs::read(self.local_dir.join(rel)).ok()
    }

    pub fn read_remote(&self, rel: &str) -> Option<Vec<u8>> {
        std::fs::read(self.remote_root().join(rel)).ok()
    }

    /// Pair configuration without filters
    pub fn config(&self) -> SynchronizerConfig {
        SynchronizerConfig::new(
            "reader",
            &self.local_dir,
            EntryPath::parse("Document/Reader").unwrap(),
        )
    }

    pub fn synchronizer(&self, resolver: Arc<ScriptedResolver>) -> Synchronizer {
        let store = Arc::new(DirectoryStore::new(self.remote_base.path()));
        self.synchronizer_with(self.config(), store, resolver)
    }

    pub fn synchronizer_with(
        &self,
        config: SynchronizerConfig,
        transfer: Arc<dyn ITransferAgent>,
        resolver: Arc<ScriptedResolver>,
    ) -> Synchronizer {
        Synchronizer::new(
            config,
            Arc::new(LocalFileSystemAdapter::new()),
            Arc::new(DirectoryStore::new(self.remote_base.path())),
            transfer,
            resolver,
        )
        .unwrap()
    }

    /// Runs one pass with a filtered configuration
    pub async fn sync_filtered(&self, extensions: &[&str], exclude: &[&str]) -> SyncReport {
        let mut config = self.config();
        config.extensions = extensions.iter().map(|e| e.to_string()).collect();
        config.exclude = exclude.iter().map(|e| e.to_string()).collect();
        let store = Arc::new(DirectoryStore::new(self.remote_base.path()));
        let report = self
            .synchronizer_with(config, store, ScriptedResolver::answering(&[]))
            .run()
            .await
            .expect("sync pass failed");
        assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
        report
    }

    /// Runs one pass, answering every conflict with `Skip`
    pub async fn sync(&self) -> SyncReport {
        self.sync_with(ScriptedResolver::answering(&[])).await
    }

    pub async fn sync_with(&self, resolver: Arc<ScriptedResolver>) -> SyncReport {
        let report = self.synchronizer(resolver).run().await.expect("sync pass failed");
        assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
        report
    }
}

fn write(path: &Path, data: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}
