//! docsync Sync - Three-way snapshot synchronization engine
//!
//! Provides:
//! - Snapshot builders for the local walk and the remote listing
//! - Per-side diff against the persisted snapshot
//! - Cross-side deletion propagation
//! - Path-aligned reconciliation with conflict classification
//! - Atomic snapshot persistence
//!
//! ## Modules
//!
//! - [`engine`] - The [`Synchronizer`](engine::Synchronizer) running one sync pass
//! - [`filesystem`] - Local filesystem adapter (`tokio::fs`)
//! - [`store`] - Directory-backed remote store and transfer adapter

pub mod builder;
pub mod diff;
pub mod engine;
pub mod filesystem;
pub mod persistence;
pub mod propagate;
pub mod reconcile;
pub mod report;
pub mod store;

use std::path::PathBuf;

use thiserror::Error;

use docsync_core::domain::errors::DomainError;

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// A domain-level error propagated from docsync-core
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),

    /// A snapshot could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The remote listing is unusable
    #[error("Invalid remote listing: {0}")]
    InvalidListing(String),

    /// An invalid filter (extension or exclude pattern) was configured
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A port implementation failed
    #[error("{operation} failed: {source:#}")]
    Collaborator {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl SyncError {
    /// Wraps a port failure with the name of the failed operation
    pub fn collaborator(operation: &'static str, source: anyhow::Error) -> Self {
        SyncError::Collaborator { operation, source }
    }
}
