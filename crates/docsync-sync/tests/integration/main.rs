//! Integration tests for docsync-sync
//!
//! Runs full sync passes between two temporary directories: a local root
//! and a [`DirectoryStore`](docsync_sync::store::DirectoryStore) standing in
//! for the remote namespace.

mod common;

mod test_conflicts;
mod test_failures;
mod test_first_sync;
mod test_incremental;
