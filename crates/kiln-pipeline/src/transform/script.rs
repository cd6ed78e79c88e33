//! `script-transpile`: JS/JSX down-levelling with oxc.

use std::path::Path;

use anyhow::{Context, anyhow, bail};
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{JsxOptions, JsxRuntime, TransformOptions, Transformer as OxcTransformer};

use super::{AssetKind, Transformer};
use crate::error::ConfigError;

pub const SCRIPT_TRANSPILE: &str = "script-transpile";

/// Parses JS/JSX, lowers syntax to the configured target and prints it back.
///
/// JSX is compiled with the classic runtime (`React.createElement`), so the
/// output needs no import injection and can be concatenated into a bundle.
#[derive(Debug, Clone)]
pub struct ScriptTranspiler {
    target: String,
}

impl ScriptTranspiler {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTarget`] when oxc does not recognise `target`.
    pub fn new(target: &str) -> Result<Self, ConfigError> {
        TransformOptions::from_target(target).map_err(|reason| ConfigError::InvalidTarget {
            target: target.to_string(),
            reason,
        })?;
        Ok(Self {
            target: target.to_string(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn options(&self) -> anyhow::Result<TransformOptions> {
        let mut options = TransformOptions::from_target(&self.target).map_err(|e| anyhow!(e))?;
        options.jsx = JsxOptions {
            runtime: JsxRuntime::Classic,
            ..JsxOptions::default()
        };
        Ok(options)
    }

    /// Transpile one script source.
    pub fn transpile(&self, source: &str, path: &Path) -> anyhow::Result<String> {
        let allocator = Allocator::default();
        // React components routinely live in plain `.js` files
        let source_type = match SourceType::from_path(path) {
            Ok(source_type) if source_type.is_javascript() => source_type.with_jsx(true),
            Ok(source_type) => source_type,
            Err(_) => SourceType::jsx(),
        };

        let parsed = Parser::new(&allocator, source, source_type).parse();
        if parsed.panicked || !parsed.errors.is_empty() {
            let messages: Vec<String> = parsed.errors.iter().map(|e| e.to_string()).collect();
            if messages.is_empty() {
                bail!("parser aborted");
            }
            bail!("{}", messages.join("; "));
        }
        let mut program = parsed.program;

        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();

        let options = self.options()?;
        let transformed = OxcTransformer::new(&allocator, path, &options)
            .build_with_scoping(scoping, &mut program);
        if !transformed.errors.is_empty() {
            let messages: Vec<String> = transformed.errors.iter().map(|e| e.to_string()).collect();
            bail!("{}", messages.join("; "));
        }

        Ok(Codegen::new().build(&program).code)
    }
}

impl Transformer for ScriptTranspiler {
    fn name(&self) -> &'static str {
        SCRIPT_TRANSPILE
    }

    fn output_kind(&self) -> AssetKind {
        AssetKind::Script
    }

    fn transform(&self, source: &[u8], path: &Path) -> anyhow::Result<Vec<u8>> {
        let source = std::str::from_utf8(source).context("script source is not valid UTF-8")?;
        self.transpile(source, path).map(String::into_bytes)
    }
}
