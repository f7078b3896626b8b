//! Conflict domain types
//!
//! This module defines the data handed to a conflict resolution policy and
//! the answers such a policy may give.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::EntryPath;
use super::sync_state::SyncState;

/// Answer of a conflict resolution policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Keep the local version: upload, overwriting the remote document
    Local,
    /// Keep the remote version: download, overwriting the local document
    Remote,
    /// Do nothing this run; both sides stay divergent
    Skip,
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Resolution::Local => "local",
            Resolution::Remote => "remote",
            Resolution::Skip => "skip",
        };
        write!(f, "{}", s)
    }
}

/// One side of a conflicting document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSide {
    /// Path in that side's snapshot coordinates
    pub path: EntryPath,
    /// Classification against that side's persisted snapshot
    pub state: SyncState,
    /// Current size in bytes
    pub size: u64,
    /// Current modification time
    pub modified: Option<DateTime<Utc>>,
}

/// A document present on both sides with differing size, where history
/// alone does not decide the outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictContext {
    /// The local document
    pub local: ConflictSide,
    /// The remote document
    pub remote: ConflictSide,
    /// True when the state pair should be impossible under the size oracle
    /// (e.g. equal/equal yet sizes differ); indicates an upstream
    /// inconsistency such as a race or clock skew
    pub anomaly: bool,
}

impl ConflictContext {
    /// Short human-readable reason, e.g. `L:modified R:modified`
    pub fn reason(&self) -> String {
        format!("L:{} R:{}", self.local.state, self.remote.state)
    }
}
