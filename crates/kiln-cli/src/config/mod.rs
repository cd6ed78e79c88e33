//! Configuration system for kiln with multi-source loading.
//!
//! Merges settings from CLI args, environment variables, and config files.
//! Priority: CLI > Environment (`KILN_*`) > File > Defaults

mod conversions;
mod defaults;
mod loading;
mod tests;
mod types;
mod validation;

use std::path::{Path, PathBuf};

use kiln_pipeline::{RuleTable, SourceFile, declared_sources, discover};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use defaults::*;
pub use loading::ConfigOverrides;
pub use types::*;

use crate::error::{BuildError, Result};

/// Kiln configuration - loaded from kiln.config.json, `KILN_*` and CLI args.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KilnConfig {
    /// Directory scanned for sources when `entries` is empty
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Explicit sources, in bundle order (relative to the project root)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<PathBuf>,

    /// Output directory
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    /// File name of the script bundle
    #[serde(default = "default_output_filename")]
    pub output_filename: String,

    /// File name of the extracted stylesheet
    #[serde(default = "default_style_filename")]
    pub style_filename: String,

    /// Emit one stylesheet per style source instead of a single file
    #[serde(default)]
    pub split_styles: bool,

    /// Port the dev server binds
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Rebuild on source changes in dev mode
    #[serde(default = "default_watch_enabled")]
    pub watch_enabled: bool,

    /// Address the dev server binds
    #[serde(default = "default_host")]
    pub host: String,

    /// Static files served by the dev server alongside the artifacts
    #[serde(default = "default_content_base")]
    pub content_base: PathBuf,

    /// Quiet period before a batch of changes triggers a rebuild
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Directory names never descended into or matched
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Ordered rule table; the first matching rule wins
    #[serde(default = "default_rule_configs")]
    pub rules: Vec<RuleConfig>,

    /// ECMAScript target for script transpilation (e.g. "es2015")
    #[serde(default = "default_target")]
    pub target: String,

    /// Minify extracted CSS
    #[serde(default)]
    pub minify: bool,

    /// Clean output directory before build
    #[serde(default)]
    pub clean: bool,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            entries: Vec::new(),
            output_directory: default_output_directory(),
            output_filename: default_output_filename(),
            style_filename: default_style_filename(),
            split_styles: false,
            server_port: default_server_port(),
            watch_enabled: default_watch_enabled(),
            host: default_host(),
            content_base: default_content_base(),
            debounce_ms: default_debounce_ms(),
            exclude: default_exclude(),
            rules: default_rule_configs(),
            target: default_target(),
            minify: false,
            clean: false,
        }
    }
}

impl KilnConfig {
    /// Generate JSON Schema for kiln.config.json.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(KilnConfig);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Generate the kiln.config.json content written by `kiln init`.
    pub fn example_config() -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Self::default())
    }

    /// Resolve every configured path against the project root.
    pub fn resolve(&self, root: &Path) -> ProjectPaths {
        ProjectPaths {
            root: root.to_path_buf(),
            source_dir: root.join(&self.source_dir),
            output_dir: root.join(&self.output_directory),
            content_base: root.join(&self.content_base),
            entries: self.entries.iter().map(|entry| root.join(entry)).collect(),
        }
    }
}

/// Absolute locations derived from a [`KilnConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub content_base: PathBuf,
    pub entries: Vec<PathBuf>,
}

impl ProjectPaths {
    /// The ordered source list for one build.
    ///
    /// Declared entries are used in order (and must exist); otherwise the
    /// source directory is walked.
    pub fn sources(&self, table: &RuleTable) -> Result<Vec<SourceFile>> {
        if self.entries.is_empty() {
            return Ok(discover(&self.source_dir, table)?);
        }

        if let Some(missing) = self.entries.iter().find(|entry| !entry.is_file()) {
            return Err(BuildError::EntryNotFound(missing.clone()).into());
        }
        Ok(declared_sources(&self.root, &self.entries))
    }
}
