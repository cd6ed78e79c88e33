//! Build command implementation.
//!
//! This module implements the `kiln build` command: one pass over the
//! project's sources that writes the script bundle and stylesheets.

use std::path::Path;
use std::time::Instant;

use kiln_pipeline::{BuildOutput, write_artifacts};

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::config::{ConfigOverrides, KilnConfig};
use crate::error::{CliError, Result};
use crate::ui;

/// Execute the build command.
///
/// # Build Process
///
/// 1. Load and validate configuration (CLI > Env > File > Defaults)
/// 2. Compile the rule table
/// 3. Discover sources and run the pipeline
/// 4. Write the artifacts atomically
/// 5. With `--clean`, remove everything else from the output directory
/// 6. Display build summary
///
/// Nothing is written or removed when any file fails to transform.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start_time = Instant::now();

    let root = utils::resolve_project_root(args.cwd.as_deref())?;
    let config = KilnConfig::load(&root, args.config.as_deref(), &ConfigOverrides::from(&args))?;
    config.validate()?;

    let output = build(&config, &root).await?;

    let entries: Vec<(String, u64)> = output
        .artifacts
        .iter()
        .map(|artifact| (artifact.name.clone(), artifact.size() as u64))
        .collect();
    ui::print_build_summary(&entries, start_time.elapsed());

    Ok(())
}

/// Run one build for `config` rooted at `root` and write its artifacts.
pub async fn build(config: &KilnConfig, root: &Path) -> Result<BuildOutput> {
    let pipeline = config.pipeline()?;
    let paths = config.resolve(root);

    utils::validate_output_dir(&config.output_directory, root)?;
    utils::ensure_output_dir(&paths.output_dir)?;

    let spinner = ui::Spinner::new("Building...");

    let sources = match paths.sources(pipeline.table()) {
        Ok(sources) => sources,
        Err(err) => {
            spinner.fail("Build failed");
            return Err(err);
        }
    };
    spinner.set_message(&format!("Processing {} files...", sources.len()));

    let result = tokio::task::spawn_blocking(move || pipeline.build(&sources))
        .await
        .map_err(|e| CliError::Custom(format!("Build task panicked: {e}")))?;

    let output = match result {
        Ok(output) => output,
        Err(err) => {
            spinner.fail("Build failed");
            return Err(err.into());
        }
    };

    let written = match write_artifacts(&output.artifacts, &paths.output_dir) {
        Ok(written) => written,
        Err(err) => {
            spinner.fail("Failed to write artifacts");
            return Err(err.into());
        }
    };

    if config.clean {
        let removed = utils::prune_output_dir(&paths.output_dir, &written)?;
        ui::debug(&format!(
            "Removed {removed} stale entries from {}",
            paths.output_dir.display()
        ));
    }

    let stats = output.stats;
    spinner.finish(&format!(
        "Built {} files to {} in {}",
        stats.processed + stats.reused,
        config.output_directory.display(),
        ui::format_duration(output.duration)
    ));
    if stats.skipped > 0 {
        ui::debug(&format!(
            "{} files matched no rule and were skipped",
            stats.skipped
        ));
    }

    Ok(output)
}
