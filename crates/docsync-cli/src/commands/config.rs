//! Config command - View and manage docsync configuration
//!
//! Provides the `docsync config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Writes a starter configuration
//! 3. Sets individual values via dot-notation keys
//! 4. Validates the configuration file and reports errors

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use docsync_core::config::{Config, ConfigBuilder, SyncPairConfig};

use super::CliContext;
use crate::output::plural;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Write a new configuration file
    Init {
        /// Directory backing the remote store (e.g. the mounted reader)
        #[arg(long)]
        remote_dir: PathBuf,
        /// Local directory of the first pair
        #[arg(long)]
        local: Option<PathBuf>,
        /// Remote folder of the first pair
        #[arg(long, default_value = "Document/Reader")]
        remote_root: String,
        /// Name of the first pair
        #[arg(long, default_value = "reader")]
        name: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (e.g. "logging.level", "pairs.reader.policy")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(ctx),
            ConfigCommand::Init {
                remote_dir,
                local,
                remote_root,
                name,
                force,
            } => {
                let mut builder = ConfigBuilder::new().remote_directory(remote_dir.clone());
                if let Some(local) = local {
                    builder = builder.pair(name, local.clone(), remote_root);
                }
                execute_init(ctx, builder, *force)
            }
            ConfigCommand::Set { key, value } => execute_set(ctx, key, value),
            ConfigCommand::Validate => execute_validate(ctx),
        }
    }
}

fn save(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    std::fs::write(path, config.to_yaml()?).context("Failed to write configuration file")?;
    Ok(())
}

fn execute_show(ctx: &CliContext) -> Result<()> {
    let formatter = ctx.formatter();
    let config = Config::load_or_default(&ctx.config_path);

    info!(config_path = %ctx.config_path.display(), "Showing configuration");

    if ctx.format.is_json() {
        let json = serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
        formatter.info("");
        for line in config.to_yaml()?.lines() {
            formatter.info(line);
        }
    }
    Ok(())
}

fn execute_init(ctx: &CliContext, builder: ConfigBuilder, force: bool) -> Result<()> {
    let formatter = ctx.formatter();
    let path = &ctx.config_path;
    if path.exists() && !force {
        anyhow::bail!("{} already exists; use --force to overwrite it", path.display());
    }

    let config = builder.build_validated().map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::anyhow!("Invalid configuration: {}", messages.join("; "))
    })?;
    save(&config, path)?;

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "config_path": path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Wrote {}", path.display()));
        if config.pairs.is_empty() {
            formatter.info("Add a pair with: docsync config set pairs.<name>.local_root <DIR>");
        }
    }
    Ok(())
}

fn execute_set(ctx: &CliContext, key: &str, value: &str) -> Result<()> {
    let formatter = ctx.formatter();
    let mut config = Config::load_or_default(&ctx.config_path);

    info!(key = %key, value = %value, "Setting configuration value");
    apply_config_value(&mut config, key, value)?;

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid value for '{key}': {}", messages.join("; "));
    }
    save(&config, &ctx.config_path)?;

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "key": key,
            "value": value,
            "config_path": ctx.config_path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Set {key} = {value}"));
        formatter.info(&format!("Saved to {}", ctx.config_path.display()));
    }
    Ok(())
}

fn execute_validate(ctx: &CliContext) -> Result<()> {
    let formatter = ctx.formatter();
    let config = ctx.load_config()?;

    info!(config_path = %ctx.config_path.display(), "Validating configuration");
    let errors = config.validate();

    if ctx.format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(ToString::to_string).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": ctx.config_path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.field("File", &ctx.config_path.display().to_string());
        formatter.field("Pairs", &config.pairs.len().to_string());
    } else {
        formatter.error(&format!("Configuration has {}:", plural(errors.len(), "error")));
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Configuration is invalid")
    }
}

/// Apply a dot-notation key/value pair to a Config struct
///
/// Supported keys:
/// - remote.directory
/// - conflicts.default_strategy
/// - logging.level
/// - pairs.<name>.{local_root, remote_root, policy, extensions, exclude};
///   setting `local_root` of an unknown pair creates it
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "remote.directory" => config.remote.directory = PathBuf::from(value),
        "conflicts.default_strategy" => config.conflicts.default_strategy = value.to_string(),
        "logging.level" => config.logging.level = value.to_string(),
        _ => {
            let Some((name, field)) = key
                .strip_prefix("pairs.")
                .and_then(|rest| rest.rsplit_once('.'))
            else {
                anyhow::bail!("Unknown configuration key: '{key}'");
            };

            if config.pair(name).is_none() {
                if field != "local_root" {
                    anyhow::bail!("No pair named '{name}'; set pairs.{name}.local_root first");
                }
                config.pairs.push(SyncPairConfig {
                    name: name.to_string(),
                    local_root: PathBuf::from(value),
                    remote_root: "Document".to_string(),
                    state_local: None,
                    state_remote: None,
                    policy: None,
                    extensions: Vec::new(),
                    exclude: Vec::new(),
                });
                return Ok(());
            }
            let pair = config
                .pairs
                .iter_mut()
                .find(|p| p.name == name)
                .ok_or_else(|| anyhow::anyhow!("No pair named '{name}'"))?;

            let list = |v: &str| -> Vec<String> {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            };
            match field {
                "local_root" => pair.local_root = PathBuf::from(value),
                "remote_root" => pair.remote_root = value.to_string(),
                "policy" => {
                    pair.policy = if value.is_empty() || value == "none" {
                        None
                    } else {
                        Some(value.to_string())
                    }
                }
                "extensions" => pair.extensions = list(value),
                "exclude" => pair.exclude = list(value),
                _ => anyhow::bail!("Unknown pair field: '{field}'"),
            }
        }
    }
    Ok(())
}
