//! Rule table and classification.
//!
//! Rules are evaluated in declaration order and the first matching,
//! non-excluded rule governs a file; there is no fallthrough. Patterns are
//! regular expressions matched against the project-relative path with `/`
//! separators, so classification does not depend on where the project lives.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path};
use std::sync::Arc;

use regex::Regex;

use crate::error::{ConfigError, TransformError};
use crate::transform::{
    AssetKind, CSS_TO_BUNDLE_ENTRY, SCRIPT_TRANSPILE, STYLE_TO_CSS, Transformer,
    TransformerRegistry,
};

/// Directory names excluded from every rule unless configured otherwise.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["node_modules"];

/// Declarative, uncompiled rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    /// Pattern a path must match.
    pub test: String,
    /// Pattern that vetoes an otherwise matching path.
    pub exclude: Option<String>,
    /// Transformer names, applied in this order.
    pub stages: Vec<String>,
}

impl RuleSpec {
    pub fn new<I, S>(test: impl Into<String>, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            test: test.into(),
            exclude: None,
            stages: stages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude = Some(pattern.into());
        self
    }
}

/// The two rules every new project starts with: scripts, then stylesheets.
pub fn default_rules() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new(r"\.(js|jsx)$", [SCRIPT_TRANSPILE]).exclude("node_modules"),
        RuleSpec::new(r"\.(scss|sass)$", [STYLE_TO_CSS, CSS_TO_BUNDLE_ENTRY]),
    ]
}

/// One resolved stage of a rule.
#[derive(Clone)]
pub struct Stage {
    transformer: Arc<dyn Transformer>,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        self.transformer.name()
    }

    pub fn transformer(&self) -> &Arc<dyn Transformer> {
        &self.transformer
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Stage").field(&self.name()).finish()
    }
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    index: usize,
    test: Regex,
    exclude: Option<Regex>,
    stages: Vec<Stage>,
}

impl Rule {
    /// Position in the rule table (zero-based).
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn test(&self) -> &str {
        self.test.as_str()
    }

    pub fn exclude(&self) -> Option<&str> {
        self.exclude.as_ref().map(Regex::as_str)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// Kind produced by the last stage.
    pub fn output_kind(&self) -> AssetKind {
        self.stages
            .last()
            .map_or(AssetKind::Script, |stage| stage.transformer.output_kind())
    }

    /// Whether `path` (normalised, `/`-separated) is governed by this rule.
    pub fn matches(&self, path: &str) -> bool {
        self.test.is_match(path) && !self.exclude.as_ref().is_some_and(|ex| ex.is_match(path))
    }

    /// Run every stage over `source`, each consuming the previous output.
    ///
    /// `path` is handed to the transformers; `reported` is the path named
    /// in a [`TransformError`].
    pub fn apply(
        &self,
        source: Vec<u8>,
        path: &Path,
        reported: &Path,
    ) -> Result<Vec<u8>, TransformError> {
        let mut current = source;
        for stage in &self.stages {
            tracing::trace!(stage = stage.name(), file = %reported.display(), "Running stage");
            current = stage
                .transformer
                .transform(&current, path)
                .map_err(|e| TransformError {
                    stage: stage.name().to_string(),
                    file: reported.to_path_buf(),
                    cause: format!("{e:#}"),
                })?;
        }
        Ok(current)
    }
}

/// Ordered rule table plus globally excluded directory names.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    excluded_dirs: Vec<String>,
}

impl RuleTable {
    /// Compile `specs` against `registry`.
    ///
    /// # Errors
    ///
    /// Fails on an empty table, a rule without stages, an invalid pattern, or
    /// a stage naming a transformer the registry does not know.
    pub fn compile(
        specs: &[RuleSpec],
        excluded_dirs: &[String],
        registry: &TransformerRegistry,
    ) -> Result<Self, ConfigError> {
        if specs.is_empty() {
            return Err(ConfigError::EmptyRuleTable);
        }

        let mut rules = Vec::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            if spec.stages.is_empty() {
                return Err(ConfigError::EmptyStages { index });
            }

            let test = compile_pattern(index, "test", &spec.test)?;
            let exclude = spec
                .exclude
                .as_deref()
                .map(|pattern| compile_pattern(index, "exclude", pattern))
                .transpose()?;

            let stages = spec
                .stages
                .iter()
                .map(|name| {
                    registry
                        .get(name)
                        .map(|transformer| Stage { transformer })
                        .ok_or_else(|| ConfigError::UnknownTransformer {
                            index,
                            name: name.clone(),
                            available: registry.names().join(", "),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            rules.push(Rule {
                index,
                test,
                exclude,
                stages,
            });
        }

        Ok(Self {
            rules,
            excluded_dirs: excluded_dirs.to_vec(),
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn excluded_dirs(&self) -> &[String] {
        &self.excluded_dirs
    }

    /// Whether a directory with this name is excluded globally.
    pub fn is_excluded_dir(&self, name: &OsStr) -> bool {
        self.excluded_dirs.iter().any(|dir| OsStr::new(dir) == name)
    }

    /// Whether any component of `path` is a globally excluded directory.
    pub fn is_excluded(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(name) => self.is_excluded_dir(name),
            _ => false,
        })
    }

    /// Return the first rule governing `path`, or `None` (no match).
    ///
    /// `path` should be relative to the project root.
    pub fn classify(&self, path: &Path) -> Option<&Rule> {
        if self.is_excluded(path) {
            return None;
        }
        let normalized = normalize_path(path);
        self.rules.iter().find(|rule| rule.matches(&normalized))
    }
}

fn compile_pattern(index: usize, field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        index,
        field,
        pattern: pattern.to_string(),
        source,
    })
}

/// Render `path` with `/` separators, dropping `.` components.
pub fn normalize_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
