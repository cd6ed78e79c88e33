//! Transformer interface and the built-in transformers.
//!
//! A transformer is a named, stateless function from bytes to bytes. Rules
//! reference transformers by name; the [`TransformerRegistry`] resolves those
//! names when a rule table is compiled.
//!
//! | name                  | input          | output |
//! |-----------------------|----------------|--------|
//! | `script-transpile`    | JS / JSX       | Script |
//! | `style-to-css`        | SCSS / Sass    | Style  |
//! | `css-to-bundle-entry` | CSS            | Style  |

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::ConfigError;

mod script;
mod style;

pub use script::{SCRIPT_TRANSPILE, ScriptTranspiler};
pub use style::{CSS_TO_BUNDLE_ENTRY, CssExtractor, STYLE_TO_CSS, SassCompiler};

/// Kind of content a transformer produces.
///
/// Aggregation routes each processed file by the kind of its rule's last stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Script,
    Style,
}

impl AssetKind {
    /// MIME type used when serving artifacts of this kind.
    pub fn content_type(self) -> &'static str {
        match self {
            AssetKind::Script => "application/javascript; charset=utf-8",
            AssetKind::Style => "text/css; charset=utf-8",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Script => f.write_str("script"),
            AssetKind::Style => f.write_str("style"),
        }
    }
}

/// A single pipeline stage.
///
/// Implementations must not keep state between calls; the same instance is
/// shared across worker threads.
pub trait Transformer: Send + Sync + fmt::Debug {
    /// Name used to reference this transformer from a rule.
    fn name(&self) -> &'static str;

    /// Kind of content produced by [`Transformer::transform`].
    fn output_kind(&self) -> AssetKind;

    /// Transform `source`, read from (or produced for) `path`.
    fn transform(&self, source: &[u8], path: &Path) -> anyhow::Result<Vec<u8>>;
}

/// Settings shared by the built-in transformers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSettings {
    /// ECMAScript target for script down-levelling (e.g. `es2015`).
    pub target: String,
    /// Minify extracted CSS.
    pub minify: bool,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            target: "es2015".to_string(),
            minify: false,
        }
    }
}

/// Name to transformer lookup used when compiling rules.
#[derive(Debug, Clone, Default)]
pub struct TransformerRegistry {
    transformers: Vec<Arc<dyn Transformer>>,
}

impl TransformerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the three built-in transformers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTarget`] if `settings.target` is not a
    /// target the script transpiler understands.
    pub fn with_defaults(settings: &TransformSettings) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        registry
            .register(Arc::new(ScriptTranspiler::new(&settings.target)?))
            .register(Arc::new(SassCompiler))
            .register(Arc::new(CssExtractor::new(settings.minify)));
        Ok(registry)
    }

    /// Register a transformer, replacing any previous one with the same name.
    pub fn register(&mut self, transformer: Arc<dyn Transformer>) -> &mut Self {
        let name = transformer.name();
        match self.transformers.iter_mut().find(|t| t.name() == name) {
            Some(slot) => *slot = transformer,
            None => self.transformers.push(transformer),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Transformer>> {
        self.transformers.iter().find(|t| t.name() == name).cloned()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}
