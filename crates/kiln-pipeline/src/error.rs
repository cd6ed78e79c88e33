//! Configuration and transformation errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while compiling a rule table or building the transformer registry.
///
/// These are always fatal and surface before any file is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Rule table is empty; at least one rule is required")]
    EmptyRuleTable,

    #[error("Rule #{} has no stages", .index + 1)]
    EmptyStages { index: usize },

    #[error("Rule #{}: invalid {field} pattern '{pattern}': {source}", .index + 1)]
    InvalidPattern {
        index: usize,
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule #{}: unknown transformer '{name}' (available: {available})", .index + 1)]
    UnknownTransformer {
        index: usize,
        name: String,
        available: String,
    },

    #[error("Invalid script target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
}

/// A stage failed while processing a file.
///
/// No partial output exists for the file when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stage '{stage}' failed for '{}': {cause}", file.display())]
pub struct TransformError {
    /// Name of the failing transformer.
    pub stage: String,
    /// Project-relative path of the file.
    pub file: PathBuf,
    /// Flattened cause chain reported by the transformer.
    pub cause: String,
}
