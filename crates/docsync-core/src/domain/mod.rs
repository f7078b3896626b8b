//! Domain entities and business logic
//!
//! This module contains the core domain types for docsync:
//! - Newtypes for validated paths and identifiers
//! - Snapshot entries and the arena-backed snapshot tree
//! - Per-run sync states and deletion sets
//! - Path translation between local and remote coordinates
//! - Conflict context and resolution types
//! - Domain-specific error types

pub mod conflict;
pub mod entry;
pub mod errors;
pub mod newtypes;
pub mod snapshot;
pub mod sync_state;
pub mod translate;

// Re-export commonly used types
pub use conflict::{ConflictContext, ConflictSide, Resolution};
pub use entry::{Entry, EntryKind};
pub use errors::DomainError;
pub use newtypes::*;
pub use snapshot::{human_size, NodeId, Preorder, Snapshot, SNAPSHOT_FORMAT_VERSION};
pub use sync_state::{DeletionSet, SyncState};
pub use translate::PathTranslator;
