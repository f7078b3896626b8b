//! Directory-backed remote store (secondary/driven adapter)
//!
//! Exposes a directory (a mounted reader, a network share, a second disk)
//! through the [`IRemoteStore`] and [`ITransferAgent`] ports. The remote
//! path `Document/Reader/a.pdf` maps to `<base>/Document/Reader/a.pdf`.
//!
//! Transfers copy into a temporary sibling and rename it into place, so an
//! interrupted copy never shows up as a truncated document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, instrument};

use docsync_core::domain::entry::EntryKind;
use docsync_core::domain::newtypes::EntryPath;
use docsync_core::ports::remote_store::{IRemoteStore, RemoteItem};
use docsync_core::ports::transfer::{
    ExistingDestination, ITransferAgent, TransferDirection, TransferOutcome, TransferPolicy,
};

use crate::filesystem::{to_utc, walk_tree};

/// Suffix of in-flight transfer files; never listed
const PARTIAL_SUFFIX: &str = ".docsync-partial";

/// Remote store backed by a local directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    base: PathBuf,
}

impl DirectoryStore {
    /// Creates a store rooted at `base`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Returns the base directory
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Filesystem location of a remote path
    pub fn resolve(&self, path: &EntryPath) -> PathBuf {
        path.components()
            .iter()
            .fold(self.base.clone(), |acc, c| acc.join(c))
    }

    /// Copies `source` over `dest` unless `policy` keeps an existing `dest`
    async fn transfer(
        &self,
        source: &Path,
        dest: &Path,
        direction: TransferDirection,
        policy: TransferPolicy,
    ) -> anyhow::Result<TransferOutcome> {
        let src_meta = tokio::fs::metadata(source)
            .await
            .with_context(|| format!("Failed to stat source {}", source.display()))?;

        match tokio::fs::metadata(dest).await {
            Ok(dst_meta) => {
                let existing = ExistingDestination {
                    source_size: src_meta.len(),
                    source_modified: src_meta.modified().ok().and_then(to_utc),
                    dest_size: dst_meta.len(),
                    dest_modified: dst_meta.modified().ok().and_then(to_utc),
                };
                if !policy.should_overwrite(direction, &existing) {
                    debug!(%policy, "Destination kept by transfer policy");
                    return Ok(TransferOutcome::Skipped);
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to stat destination {}", dest.display())))
            }
        }

        let partial = {
            let mut p = dest.as_os_str().to_owned();
            p.push(PARTIAL_SUFFIX);
            PathBuf::from(p)
        };
        tokio::fs::copy(source, &partial)
            .await
            .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))?;
        if let Err(e) = tokio::fs::rename(&partial, dest).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(anyhow::Error::new(e).context(format!("Failed to replace {}", dest.display())));
        }
        Ok(TransferOutcome::Transferred)
    }
}

#[async_trait::async_trait]
impl IRemoteStore for DirectoryStore {
    #[instrument(skip(self), fields(base = %self.base.display()))]
    async fn list_all(&self) -> anyhow::Result<Vec<RemoteItem>> {
        let walked = walk_tree(&self.base)
            .await
            .with_context(|| format!("Failed to list remote store at {}", self.base.display()))?;

        let items: Vec<RemoteItem> = walked
            .into_iter()
            .filter(|item| !item.name().ends_with(PARTIAL_SUFFIX))
            .map(|item| {
                let path = item.relative.join("/");
                let created = std::fs::metadata(&item.path)
                    .ok()
                    .and_then(|m| m.created().ok())
                    .and_then(to_utc);
                RemoteItem {
                    id: Some(path.clone()),
                    name: item.name().to_string(),
                    size: (item.kind == EntryKind::Document).then_some(item.size),
                    kind: item.kind,
                    modified: item.modified,
                    created,
                    path,
                }
            })
            .collect();

        debug!(items = items.len(), "Remote listing complete");
        Ok(items)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn create_folder(&self, path: &EntryPath) -> anyhow::Result<()> {
        let target = self.resolve(path);
        tokio::fs::create_dir(&target)
            .await
            .with_context(|| format!("Failed to create remote folder {path}"))?;
        info!("Created remote folder");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete_document(&self, path: &EntryPath) -> anyhow::Result<()> {
        tokio::fs::remove_file(self.resolve(path))
            .await
            .with_context(|| format!("Failed to delete remote document {path}"))?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete_folder(&self, path: &EntryPath) -> anyhow::Result<()> {
        tokio::fs::remove_dir(self.resolve(path))
            .await
            .with_context(|| format!("Failed to delete remote folder {path}"))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ITransferAgent for DirectoryStore {
    #[instrument(skip(self), fields(local = %local.display(), remote = %remote))]
    async fn upload(
        &self,
        local: &Path,
        remote: &EntryPath,
        policy: TransferPolicy,
    ) -> anyhow::Result<TransferOutcome> {
        let dest = self.resolve(remote);
        self.transfer(local, &dest, TransferDirection::Upload, policy)
            .await
            .with_context(|| format!("Upload of {remote} failed"))
    }

    #[instrument(skip(self), fields(remote = %remote, local = %local.display()))]
    async fn download(
        &self,
        remote: &EntryPath,
        local: &Path,
        policy: TransferPolicy,
    ) -> anyhow::Result<TransferOutcome> {
        let source = self.resolve(remote);
        self.transfer(&source, local, TransferDirection::Download, policy)
            .await
            .with_context(|| format!("Download of {remote} failed"))
    }
}
