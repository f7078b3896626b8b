//! docsync subcommands
//!
//! Every command receives a [`CliContext`] carrying the global flags.

pub mod config;
pub mod snapshot;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};

use docsync_core::config::Config;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Global options shared by all commands
#[derive(Debug, Clone)]
pub struct CliContext {
    pub format: OutputFormat,
    pub quiet: bool,
    pub config_path: PathBuf,
}

impl CliContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    /// Loads the configuration file, which must exist
    pub fn load_config(&self) -> Result<Config> {
        if !self.config_path.exists() {
            anyhow::bail!(
                "No configuration at {}. Run 'docsync config init' first.",
                self.config_path.display()
            );
        }
        Config::load(&self.config_path)
            .with_context(|| format!("Invalid configuration {}", self.config_path.display()))
    }
}
