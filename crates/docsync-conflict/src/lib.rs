//! docsync Conflict - Conflict classification and resolution policies
//!
//! Provides:
//! - The sync-state decision table for documents changed on both sides
//! - Escalation of ambiguous cases to an injected resolver
//! - Glob-rule driven resolution strategies from configuration

pub mod classifier;
pub mod error;
pub mod policy;

pub use classifier::{classify, Classification, ConflictAction, ConflictClassifier, Verdict};
pub use error::ConflictError;
pub use policy::{validate_rule, PolicyEngine, PolicyResolver, Strategy};
