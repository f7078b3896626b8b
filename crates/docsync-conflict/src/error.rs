//! Error types for the conflict engine

use thiserror::Error;

/// Errors that can occur during conflict classification and resolution
#[derive(Debug, Error)]
pub enum ConflictError {
    /// Invalid glob pattern in conflict rule
    #[error("invalid glob pattern: {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Unknown resolution strategy name
    #[error("invalid strategy '{0}'; valid: ask, remote_wins, local_wins, newer, skip")]
    InvalidStrategy(String),

    /// The injected resolver failed to produce an answer
    #[error("resolver failed: {0}")]
    ResolverFailed(#[from] anyhow::Error),
}
