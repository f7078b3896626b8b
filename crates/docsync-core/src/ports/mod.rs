//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote namespace listing and folder/document removal
//! - [`ITransferAgent`] - Document uploads and downloads
//! - [`ILocalFileSystem`] - Local walk, directory creation and deletions
//! - [`IConflictResolver`] - Resolution policy for ambiguous conflicts

pub mod local_filesystem;
pub mod remote_store;
pub mod resolver;
pub mod transfer;

pub use local_filesystem::{ILocalFileSystem, LocalItem};
pub use remote_store::{IRemoteStore, RemoteItem};
pub use resolver::IConflictResolver;
pub use transfer::{
    ExistingDestination, ITransferAgent, TransferDirection, TransferOutcome, TransferPolicy,
};
