//! Sync command - Synchronize configured root pairs
//!
//! Provides the `docsync sync` CLI command which:
//! 1. Loads and validates the configuration
//! 2. Creates the adapters (local filesystem, directory-backed remote store)
//! 3. Builds a conflict resolver per pair from the configured strategies
//! 4. Runs the Synchronizer for each selected pair and displays the reports

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::{error, info};

use docsync_conflict::{PolicyEngine, PolicyResolver};
use docsync_core::config::{Config, SyncPairConfig, VALID_CONFLICT_STRATEGIES};
use docsync_sync::engine::{Synchronizer, SynchronizerConfig};
use docsync_sync::filesystem::LocalFileSystemAdapter;
use docsync_sync::report::SyncReport;
use docsync_sync::store::DirectoryStore;

use super::CliContext;
use crate::output::{format_duration, plural, OutputFormatter};
use crate::prompt::PromptResolver;

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Only synchronize the named pair
    #[arg(long)]
    pub pair: Option<String>,

    /// Conflict strategy for this run (ask, remote_wins, local_wins, newer, skip)
    #[arg(long)]
    pub strategy: Option<String>,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config()?;

        if let Some(strategy) = &self.strategy {
            if !VALID_CONFLICT_STRATEGIES.contains(&strategy.as_str()) {
                anyhow::bail!(
                    "Invalid strategy '{strategy}'; valid options: {}",
                    VALID_CONFLICT_STRATEGIES.join(", ")
                );
            }
        }

        let errors = config.validate();
        if !errors.is_empty() {
            for e in &errors {
                formatter.error(&e.to_string());
            }
            anyhow::bail!("Configuration has {}", plural(errors.len(), "error"));
        }

        let pairs: Vec<&SyncPairConfig> = match &self.pair {
            Some(name) => vec![config
                .pair(name)
                .ok_or_else(|| anyhow::anyhow!("No pair named '{name}' in the configuration"))?],
            None => config.pairs.iter().collect(),
        };
        if pairs.is_empty() {
            formatter.warn("No pairs configured; nothing to synchronize");
            return Ok(());
        }

        let store = Arc::new(DirectoryStore::new(&config.remote.directory));
        let fs = Arc::new(LocalFileSystemAdapter::new());
        info!(remote = %config.remote.directory.display(), pairs = pairs.len(), "Starting sync");

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for pair in pairs {
            formatter.info(&format!("Synchronizing {} ...", pair.name));
            let result = match self.synchronizer(&config, pair, fs.clone(), store.clone()) {
                Ok(sync) => sync.run().await.map_err(anyhow::Error::from),
                Err(e) => Err(e),
            };
            match result {
                Ok(report) => {
                    if !ctx.format.is_json() {
                        print_report(formatter.as_ref(), &report);
                    }
                    reports.push(report);
                }
                Err(e) => {
                    error!(pair = %pair.name, error = %format!("{e:#}"), "Sync pass failed");
                    formatter.error(&format!("{}: {e:#}", pair.name));
                    failures.push(serde_json::json!({"pair": pair.name, "error": format!("{e:#}")}));
                }
            }
        }

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": failures.is_empty(),
                "reports": reports,
                "failures": failures,
            }));
        }
        if !failures.is_empty() {
            anyhow::bail!("{} failed", plural(failures.len(), "pair"));
        }
        Ok(())
    }

    fn synchronizer(
        &self,
        config: &Config,
        pair: &SyncPairConfig,
        fs: Arc<LocalFileSystemAdapter>,
        store: Arc<DirectoryStore>,
    ) -> Result<Synchronizer> {
        let sync_config = SynchronizerConfig::from_pair(pair)?;

        let strategy = self
            .strategy
            .as_deref()
            .or(pair.policy.as_deref())
            .unwrap_or(&config.conflicts.default_strategy);
        let engine = PolicyEngine::new(strategy, &config.conflicts.rules);
        let resolver = PolicyResolver::new(engine, sync_config.local_root()?)
            .with_fallback(Arc::new(PromptResolver::new()));

        Ok(Synchronizer::new(
            sync_config,
            fs,
            store.clone(),
            store,
            Arc::new(resolver),
        )?)
    }
}

fn print_report(formatter: &dyn OutputFormatter, report: &SyncReport) {
    let duration = format_duration(report.duration_ms);
    if report.changes() == 0 && report.is_clean() && report.conflicts_skipped == 0 {
        formatter.success(&format!("{}: already up to date ({duration})", report.pair));
    } else {
        formatter.success(&format!("{}: synchronized in {duration}", report.pair));
    }
    if report.first_sync {
        formatter.info("First sync: nothing was deleted, remote copies won");
    }

    let counts = [
        ("Downloaded", report.downloads, "document"),
        ("Uploaded", report.uploads, "document"),
        ("Local folders", report.folders_created_local, "folder"),
        ("Remote folders", report.folders_created_remote, "folder"),
        ("Deleted locally", report.deleted_local, "item"),
        ("Deleted remotely", report.deleted_remote, "item"),
        ("Conflicts asked", report.conflicts_asked, "conflict"),
        ("Conflicts skipped", report.conflicts_skipped, "conflict"),
    ];
    for (label, count, noun) in counts {
        if count > 0 {
            formatter.field(label, &plural(count as usize, noun));
        }
    }
    if report.anomalies > 0 {
        formatter.warn(&format!(
            "{}: {} with unexplained size differences",
            report.pair,
            plural(report.anomalies as usize, "document")
        ));
    }
    if !report.is_clean() {
        formatter.error(&format!("{}:", plural(report.errors.len(), "error")));
        for e in &report.errors {
            formatter.info(&format!("  {e}"));
        }
    }
    if !(report.persisted_local && report.persisted_remote) {
        formatter.warn("Baseline not fully persisted; the next run re-checks both sides");
    }
}
