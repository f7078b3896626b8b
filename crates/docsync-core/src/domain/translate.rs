//! Translation between local and remote snapshot coordinates
//!
//! The remote snapshot always covers the whole remote namespace (listing a
//! subtree costs as much as listing everything), while the local snapshot is
//! rooted at the user-chosen directory. A [`PathTranslator`] maps paths
//! between the two by substituting root prefixes component-wise.

use super::errors::DomainError;
use super::newtypes::EntryPath;

/// Maps paths between the local and remote snapshot of one root pair
///
/// `local_to_remote` and `remote_to_local` are exact inverses for every path
/// under the respective roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTranslator {
    local_root: EntryPath,
    remote_root: EntryPath,
}

impl PathTranslator {
    /// Creates a translator between the local root path (e.g. `reader`) and
    /// the remote root path (e.g. `Document/Reader`)
    pub fn new(local_root: EntryPath, remote_root: EntryPath) -> Self {
        Self {
            local_root,
            remote_root,
        }
    }

    /// Returns the local root path
    pub fn local_root(&self) -> &EntryPath {
        &self.local_root
    }

    /// Returns the remote root path
    pub fn remote_root(&self) -> &EntryPath {
        &self.remote_root
    }

    /// Returns true if `path` lies under (or is) the remote sync root
    pub fn is_under_remote_root(&self, path: &EntryPath) -> bool {
        path.starts_with(&self.remote_root)
    }

    /// Translates a local snapshot path into remote coordinates
    ///
    /// # Errors
    /// Returns `DomainError::PathNotInSyncRoot` if the path is outside the
    /// local root
    pub fn local_to_remote(&self, path: &EntryPath) -> Result<EntryPath, DomainError> {
        path.rebase(&self.local_root, &self.remote_root)
    }

    /// Translates a remote snapshot path into local coordinates
    ///
    /// # Errors
    /// Returns `DomainError::PathNotInSyncRoot` if the path is outside the
    /// remote root
    pub fn remote_to_local(&self, path: &EntryPath) -> Result<EntryPath, DomainError> {
        path.rebase(&self.remote_root, &self.local_root)
    }
}
