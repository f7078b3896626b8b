//! Run reporting
//!
//! A [`SyncReport`] accumulates what one sync pass did. Per-path failures
//! never abort a run; they are collected here instead.

use serde::Serialize;
use tracing::warn;

use docsync_core::domain::newtypes::RunId;

/// Summary of a completed synchronization pass
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Unique identifier of this run
    pub run_id: RunId,
    /// Name of the synchronized pair
    pub pair: String,
    /// True when no persisted baseline existed for the pair
    pub first_sync: bool,
    /// Documents copied from the remote store to the local side
    pub downloads: u32,
    /// Documents copied from the local side to the remote store
    pub uploads: u32,
    /// Folders created on the local side
    pub folders_created_local: u32,
    /// Folders created in the remote store
    pub folders_created_remote: u32,
    /// Local entries deleted because they vanished remotely
    pub deleted_local: u32,
    /// Remote entries deleted because they vanished locally
    pub deleted_remote: u32,
    /// Conflicts escalated to the resolver
    pub conflicts_asked: u32,
    /// Conflicts left unresolved this run
    pub conflicts_skipped: u32,
    /// Anomalous sync state pairs encountered
    pub anomalies: u32,
    /// Per-path errors (non-fatal)
    pub errors: Vec<String>,
    /// Whether the local snapshot was persisted
    pub persisted_local: bool,
    /// Whether the remote snapshot was persisted
    pub persisted_remote: bool,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    /// Creates an empty report for the named pair
    pub fn new(pair: impl Into<String>) -> Self {
        Self {
            run_id: RunId::new(),
            pair: pair.into(),
            first_sync: false,
            downloads: 0,
            uploads: 0,
            folders_created_local: 0,
            folders_created_remote: 0,
            deleted_local: 0,
            deleted_remote: 0,
            conflicts_asked: 0,
            conflicts_skipped: 0,
            anomalies: 0,
            errors: Vec::new(),
            persisted_local: false,
            persisted_remote: false,
            duration_ms: 0,
        }
    }

    /// Records a non-fatal per-path error
    pub fn error(&mut self, msg: String) {
        warn!(%msg);
        self.errors.push(msg);
    }

    /// Total number of changes applied to either side
    pub fn changes(&self) -> u32 {
        self.downloads
            + self.uploads
            + self.folders_created_local
            + self.folders_created_remote
            + self.deleted_local
            + self.deleted_remote
    }

    /// Returns true if the run completed without per-path errors
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
