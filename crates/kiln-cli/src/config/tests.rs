#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::error::{CliError, ConfigError};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = KilnConfig::default();
        assert_eq!(config.source_dir, PathBuf::from("src"));
        assert_eq!(config.output_directory, PathBuf::from("dist"));
        assert_eq!(config.output_filename, "index.bundle.js");
        assert_eq!(config.style_filename, "main.css");
        assert_eq!(config.server_port, 3000);
        assert!(config.watch_enabled);
        assert_eq!(config.exclude, vec!["node_modules".to_string()]);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].stages, vec!["script-transpile".to_string()]);
        assert_eq!(
            config.rules[1].stages,
            vec!["style-to-css".to_string(), "css-to-bundle-entry".to_string()]
        );
    }

    #[test]
    fn test_camel_case_fields() {
        let json = serde_json::to_value(KilnConfig::default()).unwrap();
        assert!(json.get("outputDirectory").is_some());
        assert!(json.get("serverPort").is_some());
        assert!(json.get("watchEnabled").is_some());
        assert!(json.get("output_directory").is_none());
        // Rules use webpack's `use` key for the stage list
        assert!(json["rules"][0].get("use").is_some());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: KilnConfig = serde_json::from_str(r#"{ "serverPort": 8080 }"#).unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.output_filename, "index.bundle.js");
        assert_eq!(config.rules, default_rule_configs());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = serde_json::from_str::<KilnConfig>(r#"{ "outDir": "dist" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation() {
        assert!(KilnConfig::default().validate().is_ok());

        let config = KilnConfig {
            output_filename: "js/app.js".to_string(),
            ..KilnConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CliError::Config(ConfigError::InvalidValue { ref field, .. })) if field == "outputFilename"
        ));

        let config = KilnConfig {
            style_filename: "index.bundle.js".to_string(),
            ..KilnConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CliError::Config(ConfigError::ConflictingOptions(_)))
        ));

        let config = KilnConfig {
            server_port: 0,
            ..KilnConfig::default()
        };
        assert!(config.validate().is_err());

        let config = KilnConfig {
            rules: Vec::new(),
            ..KilnConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_conversions() {
        let config = KilnConfig {
            output_filename: "app.js".to_string(),
            split_styles: true,
            minify: true,
            target: "es2017".to_string(),
            ..KilnConfig::default()
        };

        let options = config.output_options();
        assert_eq!(options.bundle_filename, "app.js");
        assert_eq!(options.style_filename, "main.css");
        assert!(options.split_styles);

        let settings = config.transform_settings();
        assert_eq!(settings.target, "es2017");
        assert!(settings.minify);

        let specs = config.rule_specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].exclude.as_deref(), Some("node_modules"));
    }

    #[test]
    fn test_compile_rules_reports_unknown_transformer() {
        let config = KilnConfig {
            rules: vec![RuleConfig {
                test: r"\.js$".to_string(),
                exclude: None,
                stages: vec!["coffee".to_string()],
            }],
            ..KilnConfig::default()
        };
        let err = config.compile_rules().unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::Rules(_))));
        assert!(err.to_string().contains("coffee"));
    }

    #[test]
    fn test_compile_rules_reports_bad_regex() {
        let config = KilnConfig {
            rules: vec![RuleConfig {
                test: "(".to_string(),
                exclude: None,
                stages: vec!["script-transpile".to_string()],
            }],
            ..KilnConfig::default()
        };
        assert!(config.compile_rules().is_err());
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = KilnConfig::load(
            temp.path(),
            Some(Path::new("missing.json")),
            &ConfigOverrides::default(),
        );
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::NotFound(_)))
        ));
    }

    #[test]
    fn test_load_file_then_overrides() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            r#"{ "outputDirectory": "file-dist", "outputFilename": "file.js" }"#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            output_directory: Some(PathBuf::from("cli-dist")),
            ..ConfigOverrides::default()
        };
        let config = KilnConfig::load(temp.path(), None, &overrides).unwrap();
        assert_eq!(config.output_directory, PathBuf::from("cli-dist"));
        assert_eq!(config.output_filename, "file.js");
    }

    #[test]
    fn test_load_malformed_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();
        let result = KilnConfig::load(temp.path(), None, &ConfigOverrides::default());
        assert!(matches!(result, Err(CliError::Config(ConfigError::Load(_)))));
    }

    #[test]
    fn test_resolve_paths() {
        let config = KilnConfig {
            entries: vec![PathBuf::from("src/a.js")],
            ..KilnConfig::default()
        };
        let paths = config.resolve(Path::new("/project"));
        assert_eq!(paths.source_dir, PathBuf::from("/project/src"));
        assert_eq!(paths.output_dir, PathBuf::from("/project/dist"));
        assert_eq!(paths.content_base, PathBuf::from("/project/public"));
        assert_eq!(paths.entries, vec![PathBuf::from("/project/src/a.js")]);
    }

    #[test]
    fn test_missing_entry() {
        let temp = TempDir::new().unwrap();
        let config = KilnConfig {
            entries: vec![PathBuf::from("src/missing.js")],
            ..KilnConfig::default()
        };
        let table = config.compile_rules().unwrap();
        let err = config.resolve(temp.path()).sources(&table).unwrap_err();
        assert!(err.to_string().contains("Entry not found"));
    }

    #[test]
    fn test_schema_and_example() {
        let schema = KilnConfig::json_schema();
        let properties = &schema["properties"];
        assert!(properties.get("rules").is_some());
        assert!(properties.get("contentBase").is_some());

        let example = KilnConfig::example_config().unwrap();
        let parsed: KilnConfig = serde_json::from_str(&example).unwrap();
        assert_eq!(parsed, KilnConfig::default());
    }
}
