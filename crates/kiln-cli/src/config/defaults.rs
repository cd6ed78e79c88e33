use std::path::PathBuf;

use kiln_pipeline::{DEFAULT_EXCLUDED_DIRS, default_rules};

use crate::config::types::RuleConfig;

pub const CONFIG_FILE_NAME: &str = "kiln.config.json";

pub fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

pub fn default_output_directory() -> PathBuf {
    PathBuf::from("dist")
}

pub fn default_output_filename() -> String {
    "index.bundle.js".to_string()
}

pub fn default_style_filename() -> String {
    "main.css".to_string()
}

pub fn default_server_port() -> u16 {
    3000
}

pub fn default_watch_enabled() -> bool {
    true
}

pub fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_content_base() -> PathBuf {
    PathBuf::from("public")
}

pub fn default_debounce_ms() -> u64 {
    100
}

pub fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDED_DIRS.iter().map(|dir| dir.to_string()).collect()
}

pub fn default_rule_configs() -> Vec<RuleConfig> {
    default_rules().iter().map(RuleConfig::from).collect()
}

pub fn default_target() -> String {
    "es2015".to_string()
}
