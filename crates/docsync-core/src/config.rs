//! Configuration module for docsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//!
//! ```yaml
//! remote:
//!   directory: /media/reader
//! pairs:
//!   - name: reader
//!     local_root: /home/user/reader
//!     remote_root: Document/Reader
//!     extensions: [pdf]
//! conflicts:
//!   default_strategy: ask
//!   rules:
//!     - pattern: "notes/**"
//!       strategy: local_wins
//! logging:
//!   level: info
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::newtypes::EntryPath;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for docsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub pairs: Vec<SyncPairConfig>,
    pub conflicts: ConflictsConfig,
    pub logging: LoggingConfig,
}

/// Location of the directory-backed remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Directory whose contents form the remote namespace.
    pub directory: PathBuf,
}

/// One synchronized root pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPairConfig {
    /// Unique name used to select the pair on the command line.
    pub name: String,
    /// Local directory to synchronize.
    pub local_root: PathBuf,
    /// Remote folder path, e.g. `Document/Reader`.
    pub remote_root: String,
    /// Persisted local snapshot location (default `<local_root>/.sync_state_local`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_local: Option<PathBuf>,
    /// Persisted remote snapshot location (default `<local_root>/.sync_state_remote`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_remote: Option<PathBuf>,
    /// Conflict strategy for this pair; overrides `conflicts.default_strategy`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    /// Document extensions to synchronize, without the dot. Empty means all.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Glob patterns (relative to the pair root) excluded on both sides.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Default file name of the persisted local snapshot.
pub const STATE_LOCAL_FILE: &str = ".sync_state_local";

/// Default file name of the persisted remote snapshot.
pub const STATE_REMOTE_FILE: &str = ".sync_state_remote";

impl SyncPairConfig {
    /// Resolved location of the persisted local snapshot.
    pub fn state_local_path(&self) -> PathBuf {
        self.state_local
            .clone()
            .unwrap_or_else(|| self.local_root.join(STATE_LOCAL_FILE))
    }

    /// Resolved location of the persisted remote snapshot.
    pub fn state_remote_path(&self) -> PathBuf {
        self.state_remote
            .clone()
            .unwrap_or_else(|| self.local_root.join(STATE_REMOTE_FILE))
    }
}

/// A glob rule selecting a conflict strategy for matching paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRule {
    /// Glob pattern matched against the path relative to the local root
    /// (e.g. `"**/*.pdf"`, `"notes/**"`).
    pub pattern: String,
    /// Strategy to apply when the pattern matches.
    pub strategy: String,
}

/// Conflict resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictsConfig {
    /// Default strategy: `ask`, `remote_wins`, `local_wins`, `newer`, or `skip`.
    pub default_strategy: String,
    /// Rules evaluated in order; the first match wins.
    pub rules: Vec<ConflictRule>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Serialize the configuration as YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/docsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("docsync")
            .join("config.yaml")
    }

    /// Look up a pair by name.
    pub fn pair(&self, name: &str) -> Option<&SyncPairConfig> {
        self.pairs.iter().find(|p| p.name == name)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            directory: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("docsync")
                .join("remote"),
        }
    }
}

impl Default for ConflictsConfig {
    fn default() -> Self {
        Self {
            default_strategy: "ask".to_string(),
            rules: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"pairs[0].remote_root"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid conflict strategies (`conflicts.default_strategy`, rules, pair policies).
pub const VALID_CONFLICT_STRATEGIES: &[&str] =
    &["ask", "remote_wins", "local_wins", "newer", "skip"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Glob syntax of
    /// rules and excludes is checked where they are compiled.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- pairs ---
        let mut seen = std::collections::HashSet::new();
        for (i, pair) in self.pairs.iter().enumerate() {
            let field = |name: &str| format!("pairs[{i}].{name}");

            if pair.name.trim().is_empty() {
                errors.push(ValidationError {
                    field: field("name"),
                    message: "must not be empty".into(),
                });
            } else if !seen.insert(pair.name.as_str()) {
                errors.push(ValidationError {
                    field: field("name"),
                    message: format!("duplicate pair name '{}'", pair.name),
                });
            }

            if pair.local_root.file_name().is_none() {
                errors.push(ValidationError {
                    field: field("local_root"),
                    message: format!(
                        "must name a directory: {}",
                        pair.local_root.display()
                    ),
                });
            }

            if let Err(e) = EntryPath::parse(&pair.remote_root) {
                errors.push(ValidationError {
                    field: field("remote_root"),
                    message: e.to_string(),
                });
            }

            if let Some(policy) = &pair.policy {
                if !VALID_CONFLICT_STRATEGIES.contains(&policy.as_str()) {
                    errors.push(ValidationError {
                        field: field("policy"),
                        message: format!(
                            "invalid strategy '{}'; valid options: {}",
                            policy,
                            VALID_CONFLICT_STRATEGIES.join(", ")
                        ),
                    });
                }
            }

            for ext in &pair.extensions {
                if ext.is_empty() || ext.contains('/') {
                    errors.push(ValidationError {
                        field: field("extensions"),
                        message: format!("invalid extension '{ext}'"),
                    });
                }
            }
        }

        // --- conflicts ---
        if !VALID_CONFLICT_STRATEGIES.contains(&self.conflicts.default_strategy.as_str()) {
            errors.push(ValidationError {
                field: "conflicts.default_strategy".into(),
                message: format!(
                    "invalid strategy '{}'; valid options: {}",
                    self.conflicts.default_strategy,
                    VALID_CONFLICT_STRATEGIES.join(", ")
                ),
            });
        }
        for (i, rule) in self.conflicts.rules.iter().enumerate() {
            if !VALID_CONFLICT_STRATEGIES.contains(&rule.strategy.as_str()) {
                errors.push(ValidationError {
                    field: format!("conflicts.rules[{i}].strategy"),
                    message: format!("invalid strategy '{}'", rule.strategy),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use docsync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .remote_directory(PathBuf::from("/media/reader"))
///     .pair("reader", PathBuf::from("/home/user/reader"), "Document/Reader")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn remote_directory(mut self, directory: PathBuf) -> Self {
        self.config.remote.directory = directory;
        self
    }

    // --- pairs ---

    /// Add a pair with default state locations, policy and filters.
    pub fn pair(
        mut self,
        name: impl Into<String>,
        local_root: PathBuf,
        remote_root: impl Into<String>,
    ) -> Self {
        self.config.pairs.push(SyncPairConfig {
            name: name.into(),
            local_root,
            remote_root: remote_root.into(),
            state_local: None,
            state_remote: None,
            policy: None,
            extensions: Vec::new(),
            exclude: Vec::new(),
        });
        self
    }

    /// Add a fully specified pair.
    pub fn pair_config(mut self, pair: SyncPairConfig) -> Self {
        self.config.pairs.push(pair);
        self
    }

    // --- conflicts ---

    pub fn conflicts_default_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.config.conflicts.default_strategy = strategy.into();
        self
    }

    pub fn conflicts_rule(mut self, pattern: impl Into<String>, strategy: impl Into<String>) -> Self {
        self.config.conflicts.rules.push(ConflictRule {
            pattern: pattern.into(),
            strategy: strategy.into(),
        });
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
