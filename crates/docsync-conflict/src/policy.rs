//! Policy engine for automatic conflict resolution
//!
//! Evaluates conflict rules from configuration to determine automatic resolution
//! strategies. Rules are matched using glob patterns in first-match-wins order
//! against the document path relative to the local root.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use glob::Pattern;
use tracing::{debug, trace, warn};

use docsync_core::config::ConflictRule;
use docsync_core::domain::conflict::{ConflictContext, Resolution};
use docsync_core::domain::newtypes::EntryPath;
use docsync_core::ports::resolver::IConflictResolver;

use crate::error::ConflictError;

/// A configured conflict strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Defer to an interactive (or otherwise injected) fallback resolver
    Ask,
    /// Keep the remote version
    RemoteWins,
    /// Keep the local version
    LocalWins,
    /// Keep the version with the later modification time
    Newer,
    /// Leave the conflict unresolved
    Skip,
}

impl FromStr for Strategy {
    type Err = ConflictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ask" => Ok(Strategy::Ask),
            "remote_wins" => Ok(Strategy::RemoteWins),
            "local_wins" => Ok(Strategy::LocalWins),
            "newer" => Ok(Strategy::Newer),
            "skip" => Ok(Strategy::Skip),
            other => Err(ConflictError::InvalidStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Ask => "ask",
            Strategy::RemoteWins => "remote_wins",
            Strategy::LocalWins => "local_wins",
            Strategy::Newer => "newer",
            Strategy::Skip => "skip",
        };
        f.write_str(s)
    }
}

/// Validates a rule's glob pattern and strategy
pub fn validate_rule(rule: &ConflictRule) -> Result<(), ConflictError> {
    Pattern::new(&rule.pattern).map_err(|e| ConflictError::InvalidPattern {
        pattern: rule.pattern.clone(),
        reason: e.to_string(),
    })?;
    rule.strategy.parse::<Strategy>()?;
    Ok(())
}

/// Engine that evaluates conflict resolution rules
pub struct PolicyEngine {
    rules: Vec<(Pattern, Strategy)>,
    default_strategy: Strategy,
}

impl PolicyEngine {
    /// Creates a PolicyEngine from the default strategy string and a list of rules
    ///
    /// Invalid rules are logged and skipped; an invalid default falls back
    /// to `ask`.
    pub fn new(default_strategy: &str, rules: &[ConflictRule]) -> Self {
        let default = default_strategy.parse().unwrap_or_else(|_| {
            warn!(strategy = %default_strategy, "Invalid default conflict strategy, using ask");
            Strategy::Ask
        });

        let compiled_rules: Vec<(Pattern, Strategy)> = rules
            .iter()
            .filter_map(|rule| {
                let pattern = match Pattern::new(&rule.pattern) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(
                            pattern = %rule.pattern,
                            error = %e,
                            "Skipping invalid conflict rule pattern"
                        );
                        return None;
                    }
                };
                let strategy = match rule.strategy.parse::<Strategy>() {
                    Ok(s) => s,
                    Err(_) => {
                        warn!(
                            strategy = %rule.strategy,
                            "Skipping invalid conflict rule strategy"
                        );
                        return None;
                    }
                };
                Some((pattern, strategy))
            })
            .collect();

        debug!(
            rules_count = compiled_rules.len(),
            default = %default,
            "PolicyEngine initialized"
        );

        Self {
            rules: compiled_rules,
            default_strategy: default,
        }
    }

    /// Evaluates the policy for a given path (relative to the local root)
    ///
    /// Uses first-match-wins: the first rule whose glob matches the path
    /// determines the strategy. If no rule matches, returns the default.
    pub fn evaluate(&self, relative_path: &str) -> Strategy {
        for (pattern, strategy) in &self.rules {
            if pattern.matches(relative_path) {
                trace!(
                    path = %relative_path,
                    pattern = %pattern,
                    strategy = %strategy,
                    "Conflict rule matched"
                );
                return *strategy;
            }
        }

        trace!(
            path = %relative_path,
            default = %self.default_strategy,
            "No conflict rule matched, using default"
        );
        self.default_strategy
    }

    /// Returns the default resolution strategy
    pub fn default_strategy(&self) -> Strategy {
        self.default_strategy
    }

    /// Returns the number of compiled rules
    pub fn rules_count(&self) -> usize {
        self.rules.len()
    }
}

/// Resolver answering conflicts from configured strategies
///
/// `ask` is delegated to the fallback resolver; without one the conflict
/// is skipped.
pub struct PolicyResolver {
    engine: PolicyEngine,
    local_root: EntryPath,
    fallback: Option<Arc<dyn IConflictResolver>>,
}

impl PolicyResolver {
    /// Creates a resolver for conflicts under `local_root`
    pub fn new(engine: PolicyEngine, local_root: EntryPath) -> Self {
        Self {
            engine,
            local_root,
            fallback: None,
        }
    }

    /// Sets the resolver consulted for the `ask` strategy
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn IConflictResolver>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn relative(&self, path: &EntryPath) -> String {
        match path.strip_prefix(&self.local_root) {
            Some(rest) => rest.join("/"),
            None => path.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl IConflictResolver for PolicyResolver {
    async fn resolve(&self, conflict: &ConflictContext) -> anyhow::Result<Resolution> {
        let relative = self.relative(&conflict.local.path);
        let strategy = self.engine.evaluate(&relative);

        let resolution = match strategy {
            Strategy::RemoteWins => Resolution::Remote,
            Strategy::LocalWins => Resolution::Local,
            Strategy::Skip => Resolution::Skip,
            Strategy::Newer => match (conflict.local.modified, conflict.remote.modified) {
                (Some(local), Some(remote)) if local > remote => Resolution::Local,
                (Some(local), Some(remote)) if remote > local => Resolution::Remote,
                _ => Resolution::Skip,
            },
            Strategy::Ask => match &self.fallback {
                Some(fallback) => return fallback.resolve(conflict).await,
                None => {
                    warn!(path = %relative, "No interactive resolver available, skipping conflict");
                    Resolution::Skip
                }
            },
        };

        debug!(path = %relative, %strategy, %resolution, "Policy resolved conflict");
        Ok(resolution)
    }
}
