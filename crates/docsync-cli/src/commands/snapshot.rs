//! Snapshot command - Inspect persisted baselines
//!
//! `docsync snapshot show <FILE>` prints a persisted snapshot as an indented
//! tree; `--pair NAME` locates the file from the configuration instead.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use docsync_core::domain::snapshot::{human_size, Snapshot};

use super::CliContext;
use crate::output::plural;

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Print a persisted snapshot
    Show {
        /// Snapshot file
        #[arg(required_unless_present = "pair", conflicts_with = "pair")]
        file: Option<PathBuf>,
        /// Show the baseline of a configured pair
        #[arg(long)]
        pair: Option<String>,
        /// With --pair, show the remote baseline instead of the local one
        #[arg(long, requires = "pair")]
        remote: bool,
    },
}

impl SnapshotCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            SnapshotCommand::Show { file, pair, remote } => {
                let path = match (file, pair) {
                    (Some(file), _) => file.clone(),
                    (None, Some(name)) => {
                        let config = ctx.load_config()?;
                        let pair = config
                            .pair(name)
                            .ok_or_else(|| anyhow::anyhow!("No pair named '{name}' in the configuration"))?;
                        if *remote {
                            pair.state_remote_path()
                        } else {
                            pair.state_local_path()
                        }
                    }
                    (None, None) => anyhow::bail!("Give a snapshot file or --pair"),
                };
                show(ctx, &path).await
            }
        }
    }
}

async fn load(path: &Path) -> Result<Snapshot> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Snapshot::deserialize(&data).with_context(|| format!("{} is not a valid snapshot", path.display()))
}

async fn show(ctx: &CliContext, path: &Path) -> Result<()> {
    let formatter = ctx.formatter();
    let snapshot = load(path).await?;

    if ctx.format.is_json() {
        let document: serde_json::Value = serde_json::from_str(&snapshot.serialize()?)
            .context("Failed to encode snapshot")?;
        formatter.print_json(&document);
        return Ok(());
    }

    let documents: Vec<_> = snapshot.preorder().filter(|e| e.is_document()).collect();
    let total: u64 = documents.iter().filter_map(|e| e.size()).sum();
    formatter.success(&format!("Snapshot {}", path.display()));
    formatter.field("Root", &snapshot.root_path().to_string());
    formatter.field(
        "Contents",
        &format!(
            "{}, {} ({})",
            plural(documents.len(), "document"),
            plural(snapshot.len() - documents.len() - 1, "folder"),
            human_size(total)
        ),
    );
    formatter.info("");
    for line in snapshot.render().lines() {
        formatter.info(line);
    }
    Ok(())
}
