//! # kiln-pipeline
//!
//! Rule-driven asset pipeline for front-end sources.
//!
//! Source files are classified against an ordered rule table, routed through the
//! stages of the first matching rule, and merged into a set of output artifacts:
//! one script bundle plus zero or more extracted stylesheets.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kiln_pipeline::{
//!     OutputOptions, Pipeline, RuleTable, TransformSettings, TransformerRegistry, default_rules,
//!     discover, write_artifacts, DEFAULT_EXCLUDED_DIRS,
//! };
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = TransformerRegistry::with_defaults(&TransformSettings::default())?;
//! let excluded: Vec<String> = DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect();
//! let table = RuleTable::compile(&default_rules(), &excluded, &registry)?;
//!
//! let root = Path::new("./src");
//! let sources = discover(root, &table)?;
//! let pipeline = Pipeline::new(table, OutputOptions::default());
//! let output = pipeline.build(&sources)?;
//! write_artifacts(&output.artifacts, Path::new("./dist"))?;
//! # Ok(()) }
//! ```
//!
//! ## Build phases
//!
//! ```text
//! discover → classify → process (parallel, cached) → aggregate → write_artifacts
//! ```

use std::path::PathBuf;

pub mod aggregate;
pub mod cache;
pub mod discover;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod rule;
pub mod transform;

pub use aggregate::{ArtifactSet, OutputArtifact, OutputOptions, aggregate};
pub use cache::{ProcessCache, hash_source};
pub use discover::{declared_sources, discover};
pub use error::{ConfigError, TransformError};
pub use output::write_artifacts;
pub use pipeline::{BuildOutput, BuildStats, Pipeline};
pub use process::{SourceFile, TransformedOutput, process};
pub use rule::{DEFAULT_EXCLUDED_DIRS, Rule, RuleSpec, RuleTable, default_rules, normalize_path};
pub use transform::{AssetKind, TransformSettings, Transformer, TransformerRegistry};

/// Error types for kiln-pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The rule table or transformer settings are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A transformer stage failed for a file.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// A source file could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source directory does not exist.
    #[error("Source directory not found: {}", .0.display())]
    SourceDirNotFound(PathBuf),

    /// Walking the source directory failed.
    #[error("Failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Two outputs of one build map to the same artifact name.
    #[error("Artifact '{name}' would be produced by both '{}' and '{}'", first.display(), second.display())]
    ArtifactConflict {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),
}

/// Result type for kiln-pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
