//! Snapshot persistence
//!
//! Each side of a root pair keeps its last-known-good snapshot in a single
//! JSON file. Writes go to a temporary sibling first and are renamed into
//! place, so a crash never leaves a truncated baseline behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use docsync_core::domain::snapshot::Snapshot;

use crate::SyncError;

/// Location of one persisted snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted snapshot
    ///
    /// A missing file means no history and returns `None`. An unreadable or
    /// corrupt file is logged and also treated as absent history.
    pub async fn load(&self) -> Option<Snapshot> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No persisted snapshot");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read persisted snapshot");
                return None;
            }
        };

        match Snapshot::deserialize(&data) {
            Ok(snapshot) => {
                debug!(
                    path = %self.path.display(),
                    entries = snapshot.len(),
                    "Loaded persisted snapshot"
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Persisted snapshot is corrupt; ignoring it"
                );
                None
            }
        }
    }

    /// Atomically replaces the persisted snapshot
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be encoded or written
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), SyncError> {
        let data = snapshot
            .serialize()
            .map_err(|e| SyncError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = {
            let mut p = self.path.as_os_str().to_owned();
            p.push(".tmp");
            PathBuf::from(p)
        };
        tokio::fs::write(&tmp_path, data.as_bytes()).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        info!(
            path = %self.path.display(),
            entries = snapshot.len(),
            "Persisted snapshot"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docsync_core::domain::entry::Entry;
    use docsync_core::domain::newtypes::EntryPath;
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        let mut s = Snapshot::build(Entry::folder(EntryPath::parse("reader").unwrap())).unwrap();
        s.insert(Entry::document(
            EntryPath::parse("reader/a.pdf").unwrap(),
            42,
            Utc::now(),
        ))
        .unwrap();
        s
    }

    #[tokio::test]
    async fn test_missing_file_is_absent_history() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join(".sync_state_local"));
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested").join(".sync_state_local"));
        let snapshot = sample();
        store.save(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        let path = EntryPath::parse("reader/a.pdf").unwrap();
        assert_eq!(loaded.get_by_path(&path), snapshot.get_by_path(&path));
        assert!(!dir.path().join("nested").join(".sync_state_local.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_absent_history() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".sync_state_remote");
        tokio::fs::write(&path, b"{ truncated").await.unwrap();
        assert!(SnapshotStore::new(&path).load().await.is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("state"));
        store.save(&sample()).await.unwrap();
        let empty = Snapshot::build(Entry::folder(EntryPath::parse("reader").unwrap())).unwrap();
        store.save(&empty).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 1);
    }
}
