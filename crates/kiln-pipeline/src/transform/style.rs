//! Stylesheet stages: `style-to-css` (grass) and `css-to-bundle-entry` (lightningcss).

use std::ffi::OsStr;
use std::path::Path;

use anyhow::{Context, anyhow};
use grass::InputSyntax;
use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{MinifyOptions, ParserOptions, StyleSheet},
};

use super::{AssetKind, Transformer};

pub const STYLE_TO_CSS: &str = "style-to-css";
pub const CSS_TO_BUNDLE_ENTRY: &str = "css-to-bundle-entry";

/// Compiles SCSS or indented Sass into plain CSS.
///
/// The syntax is picked from the file extension (`.sass` is indented, anything
/// else is treated as SCSS). `@use`/`@import` resolve relative to the file's
/// directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct SassCompiler;

impl SassCompiler {
    pub fn compile(&self, source: &str, path: &Path) -> anyhow::Result<String> {
        let syntax = match path.extension().and_then(OsStr::to_str) {
            Some("sass") => InputSyntax::Sass,
            Some("css") => InputSyntax::Css,
            _ => InputSyntax::Scss,
        };

        let mut options = grass::Options::default().input_syntax(syntax);
        if let Some(parent) = path.parent() {
            options = options.load_path(parent);
        }

        grass::from_string(source.to_owned(), &options).map_err(|e| anyhow!("{e}"))
    }
}

impl Transformer for SassCompiler {
    fn name(&self) -> &'static str {
        STYLE_TO_CSS
    }

    fn output_kind(&self) -> AssetKind {
        AssetKind::Style
    }

    fn transform(&self, source: &[u8], path: &Path) -> anyhow::Result<Vec<u8>> {
        let source = std::str::from_utf8(source).context("stylesheet is not valid UTF-8")?;
        self.compile(source, path).map(String::into_bytes)
    }
}

/// Normalises CSS through lightningcss so it can be extracted into a stylesheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssExtractor {
    minify: bool,
}

impl CssExtractor {
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }

    pub fn minify(&self) -> bool {
        self.minify
    }

    /// Parse, optionally minify, and print one CSS fragment.
    pub fn process_css(&self, source: &str, path: &Path) -> anyhow::Result<String> {
        let mut stylesheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: path.to_string_lossy().to_string(),
                ..Default::default()
            },
        )
        .map_err(|e| anyhow!("failed to parse CSS: {e}"))?;

        if self.minify {
            stylesheet
                .minify(MinifyOptions::default())
                .map_err(|e| anyhow!("failed to minify CSS: {e}"))?;
        }

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: self.minify,
                ..Default::default()
            })
            .map_err(|e| anyhow!("failed to print CSS: {e}"))?;

        Ok(result.code)
    }
}

impl Transformer for CssExtractor {
    fn name(&self) -> &'static str {
        CSS_TO_BUNDLE_ENTRY
    }

    fn output_kind(&self) -> AssetKind {
        AssetKind::Style
    }

    fn transform(&self, source: &[u8], path: &Path) -> anyhow::Result<Vec<u8>> {
        let source = std::str::from_utf8(source).context("stylesheet is not valid UTF-8")?;
        self.process_css(source, path).map(String::into_bytes)
    }
}
