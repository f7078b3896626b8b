//! Conflict resolver port (driving policy hook)
//!
//! When the history of both sides does not decide which copy of a document
//! wins, the synchronizer asks an injected [`IConflictResolver`]. The CLI
//! plugs in an interactive prompt; tests plug in scripted answers.

use crate::domain::conflict::{ConflictContext, Resolution};

/// Port trait for resolving an ambiguous document conflict
///
/// This is the only call of a run that may wait indefinitely (e.g. on a
/// user answering a prompt).
#[async_trait::async_trait]
pub trait IConflictResolver: Send + Sync {
    /// Decides which side wins for the given conflict
    async fn resolve(&self, conflict: &ConflictContext) -> anyhow::Result<Resolution>;
}
