//! Three-way synchronization engine
//!
//! The [`Synchronizer`] runs one sync pass for a root pair: a local
//! directory and a folder of the remote namespace.
//!
//! ## Sync Flow
//!
//! 1. **Build**: walk the local directory and list the whole remote namespace
//! 2. **Diff**: classify each side against its persisted snapshot
//! 3. **Propagate**: delete on each side what vanished on the other
//! 4. **Reconcile**: copy what is missing, classify what differs
//! 5. **Persist**: re-read both sides and store them as the next baseline
//!
//! Without a persisted snapshot for either side the pass is a first sync:
//! nothing is deleted, and documents present on both sides are taken from
//! the remote store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use docsync_conflict::ConflictClassifier;
use docsync_core::config::SyncPairConfig;
use docsync_core::domain::entry::Entry;
use docsync_core::domain::errors::DomainError;
use docsync_core::domain::newtypes::EntryPath;
use docsync_core::domain::snapshot::Snapshot;
use docsync_core::domain::translate::PathTranslator;
use docsync_core::ports::local_filesystem::ILocalFileSystem;
use docsync_core::ports::remote_store::IRemoteStore;
use docsync_core::ports::resolver::IConflictResolver;
use docsync_core::ports::transfer::ITransferAgent;

use crate::builder::{build_local, build_remote, prune_remote, EntryFilter};
use crate::diff::diff;
use crate::persistence::SnapshotStore;
use crate::propagate::Propagator;
use crate::reconcile::Reconciler;
use crate::report::SyncReport;
use crate::SyncError;

// ============================================================================
// Configuration
// ============================================================================

/// Everything the synchronizer needs to know about one root pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizerConfig {
    /// Pair name, used in logs and the run report
    pub name: String,
    /// Local directory to synchronize
    pub local_dir: PathBuf,
    /// Remote folder mirrored into `local_dir`, e.g. `Document/Reader`
    pub remote_root: EntryPath,
    /// Persisted local snapshot
    pub state_local: PathBuf,
    /// Persisted remote snapshot
    pub state_remote: PathBuf,
    /// Document extensions to synchronize (empty means all)
    pub extensions: Vec<String>,
    /// Glob patterns excluded on both sides, relative to the pair roots
    pub exclude: Vec<String>,
}

impl SynchronizerConfig {
    /// Creates a configuration with the state files inside `local_dir`
    pub fn new(name: impl Into<String>, local_dir: impl Into<PathBuf>, remote_root: EntryPath) -> Self {
        let local_dir = local_dir.into();
        Self {
            name: name.into(),
            state_local: local_dir.join(docsync_core::config::STATE_LOCAL_FILE),
            state_remote: local_dir.join(docsync_core::config::STATE_REMOTE_FILE),
            local_dir,
            remote_root,
            extensions: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Builds the configuration of a configured pair
    ///
    /// # Errors
    /// Returns `SyncError::DomainError` if the remote root is not a valid path
    pub fn from_pair(pair: &SyncPairConfig) -> Result<Self, SyncError> {
        Ok(Self {
            name: pair.name.clone(),
            local_dir: pair.local_root.clone(),
            remote_root: EntryPath::parse(&pair.remote_root)?,
            state_local: pair.state_local_path(),
            state_remote: pair.state_remote_path(),
            extensions: pair.extensions.clone(),
            exclude: pair.exclude.clone(),
        })
    }

    /// Root path of the local snapshot: the local directory's name
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the directory has no usable name
    pub fn local_root(&self) -> Result<EntryPath, DomainError> {
        let name = self
            .local_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                DomainError::InvalidPath(format!(
                    "{} has no name usable as a snapshot root",
                    self.local_dir.display()
                ))
            })?;
        EntryPath::root(name)
    }

    /// Root path of the remote snapshot: the top-level remote folder
    pub fn namespace_root(&self) -> Result<EntryPath, DomainError> {
        EntryPath::root(self.remote_root.components()[0].clone())
    }
}

// ============================================================================
// Synchronizer
// ============================================================================

/// Runs sync passes for one root pair
///
/// ## Dependencies
///
/// - `fs`: local walk, directory creation and deletions
/// - `store`: remote listing, folder creation and deletions
/// - `transfer`: document uploads and downloads
/// - `classifier`: decides documents changed on both sides, escalating to
///   the injected resolver
pub struct Synchronizer {
    config: SynchronizerConfig,
    filter: EntryFilter,
    fs: Arc<dyn ILocalFileSystem>,
    store: Arc<dyn IRemoteStore>,
    transfer: Arc<dyn ITransferAgent>,
    classifier: ConflictClassifier,
}

impl Synchronizer {
    /// Creates a synchronizer with the given dependencies
    ///
    /// # Errors
    /// Returns `SyncError::InvalidFilter` if an exclude pattern is invalid
    pub fn new(
        config: SynchronizerConfig,
        fs: Arc<dyn ILocalFileSystem>,
        store: Arc<dyn IRemoteStore>,
        transfer: Arc<dyn ITransferAgent>,
        resolver: Arc<dyn IConflictResolver>,
    ) -> Result<Self, SyncError> {
        let filter = EntryFilter::new(&config.extensions, &config.exclude)?;
        Ok(Self {
            config,
            filter,
            fs,
            store,
            transfer,
            classifier: ConflictClassifier::new(resolver),
        })
    }

    /// Returns the pair configuration
    pub fn config(&self) -> &SynchronizerConfig {
        &self.config
    }

    /// Runs one synchronization pass
    ///
    /// # Returns
    /// A [`SyncReport`] summarizing the pass; per-path failures are listed
    /// in it rather than aborting the run
    ///
    /// # Errors
    /// Returns an error if the local directory is missing, either side cannot
    /// be read, or the remote root cannot be created
    #[tracing::instrument(skip(self), fields(pair = %self.config.name))]
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let start = Instant::now();
        let mut report = SyncReport::new(&self.config.name);
        let local_dir = self.config.local_dir.as_path();

        // A missing local root would read as "everything deleted locally"
        let exists = self
            .fs
            .exists(local_dir)
            .await
            .map_err(|e| SyncError::collaborator("check local directory", e))?;
        if !exists {
            return Err(SyncError::PathNotFound(local_dir.to_path_buf()));
        }

        let local_root = self.config.local_root()?;
        let namespace_root = self.config.namespace_root()?;
        let translator = PathTranslator::new(local_root.clone(), self.config.remote_root.clone());

        info!(
            run_id = %report.run_id,
            local = %local_dir.display(),
            remote = %self.config.remote_root,
            "Starting sync pass"
        );

        // Step 1: baselines and current state
        let local_state = SnapshotStore::new(&self.config.state_local);
        let remote_state = SnapshotStore::new(&self.config.state_remote);
        let persisted_local = baseline(local_state.load().await, &local_root);
        let persisted_remote = baseline(remote_state.load().await, &self.config.remote_root);

        let mut local = self.read_local(local_dir, &local_root).await?;
        let (mut remote, namespace_exists) = self.read_remote(&namespace_root).await?;
        self.ensure_remote_root(&mut remote, namespace_exists).await?;

        // Step 2: per-side diff
        let first_sync = persisted_local.is_none() || persisted_remote.is_none();
        report.first_sync = first_sync;
        let (persisted_local, persisted_remote) = if first_sync {
            warn!("No complete baseline for this pair; first sync deletes nothing and lets the remote side win");
            (None, None)
        } else {
            (persisted_local, persisted_remote)
        };
        let local_deletions = diff(&mut local, persisted_local.as_ref())?;
        let remote_deletions = diff(&mut remote, persisted_remote.as_ref())?;
        debug!(
            local_deletions = local_deletions.len(),
            remote_deletions = remote_deletions.len(),
            "Diff complete"
        );

        // Step 3: cross-side deletions
        let propagator = Propagator::new(&translator, local_dir, self.fs.as_ref(), self.store.as_ref());
        propagator
            .to_remote(&local_deletions, &mut remote, &mut report)
            .await;
        propagator
            .to_local(&remote_deletions, &mut local, &mut report)
            .await;

        // Step 4: reconciliation
        Reconciler::new(
            &translator,
            local_dir,
            self.fs.as_ref(),
            self.store.as_ref(),
            self.transfer.as_ref(),
            &self.classifier,
        )
        .first_sync(first_sync)
        .reconcile(&local, &remote, &mut report)
        .await;

        // Step 5: persist what both sides look like now
        self.persist(&local_state, &remote_state, &local_root, &namespace_root, &mut report)
            .await;

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            downloads = report.downloads,
            uploads = report.uploads,
            deleted_local = report.deleted_local,
            deleted_remote = report.deleted_remote,
            conflicts_asked = report.conflicts_asked,
            conflicts_skipped = report.conflicts_skipped,
            errors = report.errors.len(),
            duration_ms = report.duration_ms,
            "Sync pass complete"
        );
        Ok(report)
    }

    async fn read_local(&self, local_dir: &Path, local_root: &EntryPath) -> Result<Snapshot, SyncError> {
        let items = self
            .fs
            .walk(local_dir)
            .await
            .map_err(|e| SyncError::collaborator("walk local directory", e))?;
        build_local(local_root, items, &self.filter)
    }

    /// Builds the remote snapshot, scoped by the pair filter below the
    /// remote root, and reports whether the listing showed anything at or
    /// below the namespace root
    async fn read_remote(&self, namespace_root: &EntryPath) -> Result<(Snapshot, bool), SyncError> {
        let items = self
            .store
            .list_all()
            .await
            .map_err(|e| SyncError::collaborator("list remote store", e))?;
        let namespace_exists = items.iter().any(|item| {
            EntryPath::parse(&item.path).is_ok_and(|path| path.starts_with(namespace_root))
        });
        let mut remote = build_remote(namespace_root, items)?;
        prune_remote(&mut remote, &self.config.remote_root, &self.filter);
        Ok((remote, namespace_exists))
    }

    /// Creates the remote root and any missing ancestor folders
    async fn ensure_remote_root(&self, remote: &mut Snapshot, namespace_exists: bool) -> Result<(), SyncError> {
        let components = self.config.remote_root.components();
        if !namespace_exists {
            info!(path = %remote.root_path(), "Creating missing remote namespace root");
            self.store
                .create_folder(remote.root_path())
                .await
                .map_err(|e| SyncError::collaborator("create remote namespace root", e))?;
        }
        for depth in 2..=components.len() {
            let path = EntryPath::new(components[..depth].iter().cloned())?;
            if remote.contains(&path) {
                continue;
            }
            info!(path = %path, "Creating missing remote root folder");
            self.store
                .create_folder(&path)
                .await
                .map_err(|e| SyncError::collaborator("create remote root", e))?;
            remote.insert(Entry::folder(path))?;
        }
        Ok(())
    }

    /// Re-reads both sides and stores them as the next baseline
    ///
    /// A side that cannot be re-read is left with its previous baseline.
    async fn persist(
        &self,
        local_state: &SnapshotStore,
        remote_state: &SnapshotStore,
        local_root: &EntryPath,
        namespace_root: &EntryPath,
        report: &mut SyncReport,
    ) {
        match self.read_local(&self.config.local_dir, local_root).await {
            Ok(local) => match local_state.save(&local).await {
                Ok(()) => report.persisted_local = true,
                Err(e) => report.error(format!("Failed to persist local snapshot: {e}")),
            },
            Err(e) => warn!(error = %e, "Local side unreadable after sync; baseline not updated"),
        }

        let remote = self
            .read_remote(namespace_root)
            .await
            .and_then(|(remote, _)| remote.subtree(&self.config.remote_root).map_err(SyncError::from));
        match remote {
            Ok(subtree) => match remote_state.save(&subtree).await {
                Ok(()) => report.persisted_remote = true,
                Err(e) => report.error(format!("Failed to persist remote snapshot: {e}")),
            },
            Err(e) => warn!(error = %e, "Remote side unreadable after sync; baseline not updated"),
        }
    }
}

/// Keeps a persisted snapshot only if it belongs to the expected root
fn baseline(persisted: Option<Snapshot>, expected_root: &EntryPath) -> Option<Snapshot> {
    match persisted {
        Some(snapshot) if snapshot.root_path() == expected_root => Some(snapshot),
        Some(snapshot) => {
            warn!(
                found = %snapshot.root_path(),
                expected = %expected_root,
                "Persisted snapshot belongs to a different root; ignoring it"
            );
            None
        }
        None => None,
    }
}
