//! Error handling for the kiln CLI.
//!
//! A small hierarchy built with `thiserror`:
//! - [`CliError`] is what every command returns
//! - [`ConfigError`] and [`BuildError`] carry the details and a `Hint:` line
//!   telling the user what to do next
//!
//! Errors from `kiln-pipeline` are mapped into this hierarchy by `From`
//! implementations so commands can use `?` throughout.
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_entry(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

mod report;

pub use report::{build_error_to_miette, cli_error_to_miette};

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration loading or validation failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A build failed
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Development server errors
    #[error("Server error: {0}")]
    Server(String),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration errors.
///
/// All of these are raised before any file is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file doesn't exist at the given location
    #[error("Config file not found: {}\n\nHint: Run 'kiln init' to create kiln.config.json or pass --config <path>", .0.display())]
    NotFound(PathBuf),

    /// Config file already exists (init without --force)
    #[error("Config file already exists: {}\n\nHint: Use --force to overwrite it", .0.display())]
    AlreadyExists(PathBuf),

    /// Config sources could not be merged or deserialized
    #[error("Failed to load configuration: {0}\n\nHint: Check kiln.config.json syntax, field names and KILN_* environment variables")]
    Load(String),

    /// Mutually exclusive options were specified
    #[error("Conflicting options: {0}\n\nHint: These options cannot be used together")]
    ConflictingOptions(String),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// What a valid value looks like
        hint: String,
    },

    /// The rule table or transformer settings are invalid
    #[error("Invalid rule table: {0}\n\nHint: Run 'kiln check' to inspect the compiled rules")]
    Rules(#[from] kiln_pipeline::ConfigError),

    /// I/O error while reading or writing config
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
}

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Source directory doesn't exist
    #[error("Source directory not found: {}\n\nHint: Check 'sourceDir' in kiln.config.json or run from the project root", .0.display())]
    SourceDirNotFound(PathBuf),

    /// Declared entry doesn't exist
    #[error("Entry not found: {}\n\nHint: Check the 'entries' list in kiln.config.json", .0.display())]
    EntryNotFound(PathBuf),

    /// A source file could not be read
    #[error("Failed to read source {}: {error}", .file.display())]
    ReadFailed {
        /// File that could not be read
        file: PathBuf,
        /// Underlying I/O error
        error: String,
    },

    /// A transformer stage failed
    #[error("Transform error in {} (stage '{stage}'): {error}\n\nHint: {hint}", .file.display())]
    TransformError {
        /// File that failed to transform
        file: PathBuf,
        /// Failing stage
        stage: String,
        /// The transformation error
        error: String,
        /// Helpful hint for fixing
        hint: String,
    },

    /// Two sources would be written to the same artifact
    #[error("Artifact '{name}' would be produced by both {} and {}\n\nHint: Rename one of the sources or turn off splitStyles", .first.display(), .second.display())]
    ArtifactConflict {
        /// Artifact name both sources map to
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Failed to write an artifact
    #[error("Failed to write artifacts: {0}\n\nHint: Check output directory permissions")]
    AssetWriteFailed(String),

    /// Output directory is not safe to write to
    #[error("Output directory is not writable: {}\n\nHint: Choose a project-local directory such as 'dist'", .0.display())]
    OutputNotWritable(PathBuf),

    /// Generic build error
    #[error("{0}")]
    Custom(String),
}

impl BuildError {
    fn from_transform(err: kiln_pipeline::TransformError) -> Self {
        let hint = match err.stage.as_str() {
            "script-transpile" => "Fix the syntax error above; scripts must parse as JavaScript/JSX",
            "style-to-css" => "Check Sass variables, mixins and @use paths in the stylesheet",
            "css-to-bundle-entry" => "The compiled CSS could not be parsed; check the stylesheet output",
            _ => "Check the file contents against the rule's stages",
        };
        BuildError::TransformError {
            file: err.file,
            stage: err.stage,
            error: err.cause,
            hint: hint.to_string(),
        }
    }
}

impl From<kiln_pipeline::Error> for CliError {
    fn from(err: kiln_pipeline::Error) -> Self {
        use kiln_pipeline::Error as P;

        match err {
            P::Config(e) => CliError::Config(ConfigError::Rules(e)),
            P::Transform(e) => CliError::Build(BuildError::from_transform(e)),
            P::Read { path, source } => CliError::Build(BuildError::ReadFailed {
                file: path,
                error: source.to_string(),
            }),
            P::SourceDirNotFound(path) => CliError::Build(BuildError::SourceDirNotFound(path)),
            P::Walk(e) => CliError::Build(BuildError::Custom(e.to_string())),
            P::ArtifactConflict {
                name,
                first,
                second,
            } => CliError::Build(BuildError::ArtifactConflict {
                name,
                first,
                second,
            }),
            P::InvalidOutputPath(msg) | P::WriteFailure(msg) => {
                CliError::Build(BuildError::AssetWriteFailed(msg))
            }
        }
    }
}

impl From<kiln_pipeline::ConfigError> for CliError {
    fn from(err: kiln_pipeline::ConfigError) -> Self {
        CliError::Config(ConfigError::Rules(err))
    }
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    ///
    /// ```rust,no_run
    /// # use std::path::Path;
    /// # use kiln_cli::error::{Result, ResultExt};
    /// # fn run() -> Result<()> {
    /// let path = Path::new("missing.scss");
    /// std::fs::read_to_string(path).with_path(path)?;
    /// # Ok(())
    /// # }
    /// ```
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a `Hint:` line to the error.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }
}
