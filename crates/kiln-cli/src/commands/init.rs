//! Init command implementation.
//!
//! Writes a kiln.config.json holding every default so it can be edited.

use std::fs;

use crate::cli::InitArgs;
use crate::commands::utils;
use crate::config::{CONFIG_FILE_NAME, KilnConfig};
use crate::error::{ConfigError, Result};
use crate::ui;

/// Execute the init command.
///
/// # Errors
///
/// `ConfigError::AlreadyExists` when the file exists and `--force` wasn't
/// given, `ConfigError::Io` when it can't be written.
pub async fn execute(args: InitArgs) -> Result<()> {
    let root = utils::resolve_project_root(args.cwd.as_deref())?;
    let path = root.join(CONFIG_FILE_NAME);

    if path.exists() && !args.force {
        return Err(ConfigError::AlreadyExists(path).into());
    }

    let mut content = KilnConfig::example_config()?;
    content.push('\n');
    fs::write(&path, content).map_err(ConfigError::Io)?;

    ui::success(&format!("Created {}", path.display()));
    ui::info("Next: put sources under src/ and run 'kiln build' or 'kiln dev'");
    Ok(())
}
