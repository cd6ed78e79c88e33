use crate::cli::parse_filename;
use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};

impl KilnConfig {
    /// Validate configuration for logical consistency.
    ///
    /// Regex and transformer-name errors are reported by
    /// [`KilnConfig::compile_rules`], which runs after this.
    pub fn validate(&self) -> Result<()> {
        for (field, name) in [
            ("outputFilename", &self.output_filename),
            ("styleFilename", &self.style_filename),
        ] {
            if let Err(reason) = parse_filename(name) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: format!("{name:?} ({reason})"),
                    hint: "Use a bare file name such as 'index.bundle.js'".to_string(),
                }
                .into());
            }
        }

        if self.output_filename == self.style_filename {
            return Err(ConfigError::ConflictingOptions(format!(
                "outputFilename and styleFilename are both '{}'",
                self.output_filename
            ))
            .into());
        }

        if self.server_port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "serverPort".to_string(),
                value: "0".to_string(),
                hint: "Use a port between 1 and 65535".to_string(),
            }
            .into());
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "host".to_string(),
                value: "\"\"".to_string(),
                hint: "Use an address such as 127.0.0.1 or 0.0.0.0".to_string(),
            }
            .into());
        }

        if self.rules.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "rules".to_string(),
                value: "[]".to_string(),
                hint: "Declare at least one rule, or remove 'rules' to use the defaults"
                    .to_string(),
            }
            .into());
        }

        Ok(())
    }
}
