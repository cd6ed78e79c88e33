//! Conversion of CLI errors into miette reports for the top of `main`.

use miette::Report;

use crate::error::{BuildError, CliError};

/// Convert a [`CliError`] into a miette [`Report`].
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => build_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert a [`BuildError`] into a miette [`Report`].
///
/// Transform failures get their own layout so the file and stage lead the report.
pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::TransformError {
            file,
            stage,
            error,
            hint,
        } => miette::miette!(
            "Transform error in {}\nStage: {}\n\n{}\n\nHint: {}",
            file.display(),
            stage,
            error,
            hint
        ),
        _ => miette::miette!("{}", err),
    }
}
