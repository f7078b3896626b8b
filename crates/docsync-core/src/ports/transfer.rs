//! Transfer port (driven/secondary port)
//!
//! Uploads and downloads of document content between a local file and a
//! remote path. Every transfer carries a [`TransferPolicy`] deciding what
//! happens when the destination already exists.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::newtypes::EntryPath;

/// Winner rule applied when a transfer destination already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPolicy {
    /// The local copy wins: uploads overwrite, downloads are skipped
    LocalWins,
    /// The remote copy wins: downloads overwrite, uploads are skipped
    RemoteWins,
    /// The copy with the later modification time wins
    Newer,
    /// Existing destinations are never touched
    Skip,
}

/// Direction of a document transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Local file to remote store
    Upload,
    /// Remote store to local file
    Download,
}

/// Result of a transfer request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOutcome {
    /// Content was written to the destination
    Transferred,
    /// The destination was kept as it was
    Skipped,
}

/// State of an existing transfer destination, as seen by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingDestination {
    /// Size of the source document
    pub source_size: u64,
    /// Modification time of the source document
    pub source_modified: Option<DateTime<Utc>>,
    /// Size of the existing destination document
    pub dest_size: u64,
    /// Modification time of the existing destination document
    pub dest_modified: Option<DateTime<Utc>>,
}

impl TransferPolicy {
    /// Decides whether a transfer may overwrite an existing destination
    ///
    /// Equal sizes never transfer. `Newer` transfers only when the source
    /// is strictly later than the destination; an unknown time loses.
    pub fn should_overwrite(&self, direction: TransferDirection, existing: &ExistingDestination) -> bool {
        if existing.source_size == existing.dest_size {
            return false;
        }
        match (self, direction) {
            (TransferPolicy::LocalWins, TransferDirection::Upload) => true,
            (TransferPolicy::LocalWins, TransferDirection::Download) => false,
            (TransferPolicy::RemoteWins, TransferDirection::Download) => true,
            (TransferPolicy::RemoteWins, TransferDirection::Upload) => false,
            (TransferPolicy::Newer, _) => match (existing.source_modified, existing.dest_modified) {
                (Some(src), Some(dst)) => src > dst,
                (Some(_), None) => true,
                _ => false,
            },
            (TransferPolicy::Skip, _) => false,
        }
    }

    /// Returns the policy name as used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            TransferPolicy::LocalWins => "local_wins",
            TransferPolicy::RemoteWins => "remote_wins",
            TransferPolicy::Newer => "newer",
            TransferPolicy::Skip => "skip",
        }
    }
}

impl fmt::Display for TransferPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransferPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local_wins" => Ok(TransferPolicy::LocalWins),
            "remote_wins" => Ok(TransferPolicy::RemoteWins),
            "newer" => Ok(TransferPolicy::Newer),
            "skip" => Ok(TransferPolicy::Skip),
            other => Err(format!("unknown transfer policy: {other}")),
        }
    }
}

/// Port trait for document content transfers
#[async_trait::async_trait]
pub trait ITransferAgent: Send + Sync {
    /// Uploads the local file at `local` to the remote path `remote`
    ///
    /// The remote parent folder must already exist.
    async fn upload(
        &self,
        local: &Path,
        remote: &EntryPath,
        policy: TransferPolicy,
    ) -> anyhow::Result<TransferOutcome>;

    /// Downloads the remote document at `remote` into the local file `local`
    ///
    /// The local parent directory must already exist.
    async fn download(
        &self,
        remote: &EntryPath,
        local: &Path,
        policy: TransferPolicy,
    ) -> anyhow::Result<TransferOutcome>;
}
