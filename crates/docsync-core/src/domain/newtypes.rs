//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers and values.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// UUID-based ID types
// ============================================================================

/// Identifier for a single synchronizer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random RunId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Path types
// ============================================================================

/// A structured path inside a snapshot: an ordered, non-empty sequence of
/// name components.
///
/// The first component names the snapshot root (`Document` for the remote
/// namespace, the local root directory's name for the local side). Each
/// component is guaranteed to be:
/// - non-empty
/// - not `.` or `..`
/// - free of `/` and NUL characters
///
/// Comparisons and prefix tests work component-wise, so `Doc/a` is never
/// treated as a prefix of `Doc/ab`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryPath(Vec<String>);

impl EntryPath {
    /// Create an EntryPath from individual components
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the sequence is empty or any
    /// component is malformed
    pub fn new<I, S>(components: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let components: Vec<String> = components.into_iter().map(Into::into).collect();
        if components.is_empty() {
            return Err(DomainError::InvalidPath(
                "Path must have at least one component".to_string(),
            ));
        }
        for component in &components {
            validate_component(component)?;
        }
        Ok(Self(components))
    }

    /// Parse a `/`-separated path such as `Document/Reader/a.pdf`
    ///
    /// A single leading `/` is accepted and ignored.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` for empty paths, doubled slashes,
    /// trailing slashes or traversal components
    pub fn parse(path: &str) -> Result<Self, DomainError> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        if trimmed.is_empty() {
            return Err(DomainError::InvalidPath(format!("Empty path: '{path}'")));
        }
        Self::new(trimmed.split('/'))
            .map_err(|e| DomainError::InvalidPath(format!("'{path}': {e}")))
    }

    /// Create a single-component path naming a snapshot root
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the name is not a valid component
    pub fn root(name: impl Into<String>) -> Result<Self, DomainError> {
        Self::new([name.into()])
    }

    /// Returns the path components
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of components (a root path has depth 1)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns true if this path names a snapshot root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Returns the last component
    #[must_use]
    pub fn name(&self) -> &str {
        // Non-empty by construction
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// Returns the parent path, or `None` for a root path
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append a single component
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the component is malformed
    pub fn join(&self, component: &str) -> Result<Self, DomainError> {
        validate_component(component)?;
        let mut components = self.0.clone();
        components.push(component.to_string());
        Ok(Self(components))
    }

    /// Returns true if `prefix` is this path or one of its ancestors
    #[must_use]
    pub fn starts_with(&self, prefix: &EntryPath) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Returns the components following `prefix`, or `None` if `prefix` is
    /// not an ancestor-or-self of this path
    #[must_use]
    pub fn strip_prefix(&self, prefix: &EntryPath) -> Option<&[String]> {
        if self.starts_with(prefix) {
            Some(&self.0[prefix.0.len()..])
        } else {
            None
        }
    }

    /// Replace the `from` prefix of this path with `to`
    ///
    /// # Errors
    /// Returns `DomainError::PathNotInSyncRoot` if `from` is not a prefix
    pub fn rebase(&self, from: &EntryPath, to: &EntryPath) -> Result<Self, DomainError> {
        let rest = self.strip_prefix(from).ok_or_else(|| {
            DomainError::PathNotInSyncRoot(format!("{self} is not within {from}"))
        })?;
        let mut components = to.0.clone();
        components.extend(rest.iter().cloned());
        Ok(Self(components))
    }

    /// Resolve this path against a filesystem directory standing for `root`
    ///
    /// `Path::join` is applied per component, so the result is always inside
    /// `dir` (components cannot contain separators or traversal).
    ///
    /// # Errors
    /// Returns `DomainError::PathNotInSyncRoot` if `root` is not a prefix
    pub fn to_fs_path(&self, root: &EntryPath, dir: &Path) -> Result<PathBuf, DomainError> {
        let rest = self.strip_prefix(root).ok_or_else(|| {
            DomainError::PathNotInSyncRoot(format!("{self} is not within {root}"))
        })?;
        Ok(rest.iter().fold(dir.to_path_buf(), |acc, c| acc.join(c)))
    }
}

fn validate_component(component: &str) -> Result<(), DomainError> {
    if component.is_empty() {
        return Err(DomainError::InvalidPath("Empty path component".to_string()));
    }
    if component == "." || component == ".." {
        return Err(DomainError::InvalidPath(format!(
            "Traversal component not allowed: {component}"
        )));
    }
    if component.contains('/') || component.contains('\0') {
        return Err(DomainError::InvalidPath(format!(
            "Invalid character in path component: {component:?}"
        )));
    }
    Ok(())
}

impl Display for EntryPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for EntryPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntryPath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<EntryPath> for String {
    fn from(path: EntryPath) -> Self {
        path.to_string()
    }
}

// ============================================================================
// Remote store identifiers
// ============================================================================

/// Opaque identifier assigned to an entry by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Create a new RemoteId
    ///
    /// # Errors
    /// Returns `DomainError::ValidationFailed` if the id is empty
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Remote id cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RemoteId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemoteId> for String {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

// ============================================================================
// Tests
// ============================================================================
