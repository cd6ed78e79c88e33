//! Processing of a single classified file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::hash_source;
use crate::error::TransformError;
use crate::rule::Rule;
use crate::transform::AssetKind;
use crate::{Error, Result};

/// A source file, known by its absolute path and its path relative to the
/// project root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative: PathBuf,
}

impl SourceFile {
    /// Build a source file for `path`, relative to `root` when possible.
    pub fn new(root: &Path, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let path = if path.is_absolute() {
            path
        } else {
            root.join(path)
        };
        let relative = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        Self { path, relative }
    }
}

/// The result of running a rule's stages over one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedOutput {
    /// Project-relative path of the source.
    pub path: PathBuf,
    pub kind: AssetKind,
    pub content: Vec<u8>,
    /// BLAKE3 hash of the source bytes the output was produced from.
    pub source_hash: [u8; 32],
}

/// Read `file` and run it through `rule`.
///
/// # Errors
///
/// [`Error::Read`] if the file cannot be read, [`Error::Transform`] if a stage fails.
pub fn process(file: &SourceFile, rule: &Rule) -> Result<TransformedOutput> {
    let source = fs::read(&file.path).map_err(|source| Error::Read {
        path: file.path.clone(),
        source,
    })?;
    let hash = hash_source(&source);
    Ok(process_source(file, rule, source, hash)?)
}

pub(crate) fn process_source(
    file: &SourceFile,
    rule: &Rule,
    source: Vec<u8>,
    source_hash: [u8; 32],
) -> std::result::Result<TransformedOutput, TransformError> {
    let content = rule.apply(source, &file.path, &file.relative)?;
    Ok(TransformedOutput {
        path: file.relative.clone(),
        kind: rule.output_kind(),
        content,
        source_hash,
    })
}
