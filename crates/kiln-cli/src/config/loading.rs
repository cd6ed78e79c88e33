use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use serde::Serialize;

use crate::cli::{BuildArgs, DevArgs};
use crate::config::{CONFIG_FILE_NAME, KilnConfig};
use crate::error::{ConfigError, Result};

/// Environment variable prefix, e.g. `KILN_SERVER_PORT=4000`.
pub const ENV_PREFIX: &str = "KILN_";

/// Keys settable from the environment, after the prefix (matched case-insensitively).
const ENV_KEYS: &[&str] = &[
    "source_dir",
    "entries",
    "output_directory",
    "output_filename",
    "style_filename",
    "split_styles",
    "server_port",
    "watch_enabled",
    "host",
    "content_base",
    "debounce_ms",
    "exclude",
    "target",
    "minify",
    "clean",
];

/// Values given on the command line. Only the `Some` fields are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<bool>,
}

impl From<&BuildArgs> for ConfigOverrides {
    fn from(args: &BuildArgs) -> Self {
        Self {
            output_directory: args.out_dir.clone(),
            output_filename: args.filename.clone(),
            minify: args.minify.then_some(true),
            clean: args.clean.then_some(true),
            ..Self::default()
        }
    }
}

impl From<&DevArgs> for ConfigOverrides {
    fn from(args: &DevArgs) -> Self {
        Self {
            server_port: args.port,
            host: args.host.clone(),
            watch_enabled: args.no_watch.then_some(false),
            ..Self::default()
        }
    }
}

/// `output_directory` -> `outputDirectory`
fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// The config file to read, if any.
///
/// An explicit path must exist; the default `kiln.config.json` is optional.
fn locate_config_file(root: &Path, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            let path = root.join(path);
            if path.is_file() {
                Ok(Some(path))
            } else {
                Err(ConfigError::NotFound(path).into())
            }
        }
        None => {
            let default_path = root.join(CONFIG_FILE_NAME);
            Ok(default_path.is_file().then_some(default_path))
        }
    }
}

impl KilnConfig {
    /// Load configuration from multiple sources.
    /// Priority: CLI args > environment variables > config file > defaults
    pub fn load(
        root: &Path,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = locate_config_file(root, config_path)? {
            tracing::debug!(path = %path.display(), "Loading config file");
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .lowercase(false)
                .filter(|key| ENV_KEYS.contains(&key.as_str().to_ascii_lowercase().as_str()))
                .map(|key| snake_to_camel(&key.as_str().to_ascii_lowercase()).into()),
        );

        figment = figment.merge(Serialized::defaults(overrides));

        figment
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()).into())
    }
}
