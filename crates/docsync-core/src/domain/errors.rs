//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including path validation failures, tree structure violations and
//! snapshot format errors.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Path is not within the configured sync root
    #[error("Path not within sync root: {0}")]
    PathNotInSyncRoot(String),

    /// An entry with the same path already exists in the snapshot
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// The parent of an entry is missing from the snapshot
    #[error("Missing parent for entry: {0}")]
    MissingParent(String),

    /// A document node was used where a folder is required
    #[error("Not a folder: {0}")]
    NotAFolder(String),

    /// The snapshot root cannot be removed or replaced
    #[error("Cannot remove the snapshot root: {0}")]
    RootRemoval(String),

    /// Serialized snapshot could not be decoded
    #[error("Invalid snapshot format: {0}")]
    InvalidSnapshot(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
