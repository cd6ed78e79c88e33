//! Source discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::process::SourceFile;
use crate::rule::RuleTable;
use crate::{Error, Result};

/// Walk `root` and return every file in a deterministic order.
///
/// Entries are visited depth first and sorted by file name. Directories the
/// rule table excludes globally are pruned without being descended into.
///
/// # Errors
///
/// [`Error::SourceDirNotFound`] if `root` is not a directory, [`Error::Walk`]
/// if a directory cannot be read.
pub fn discover(root: &Path, table: &RuleTable) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(Error::SourceDirNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(entry.file_type().is_dir() && table.is_excluded_dir(entry.file_name()))
        });

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(SourceFile::new(root, entry.into_path()));
        }
    }

    tracing::debug!(root = %root.display(), files = files.len(), "Discovered sources");
    Ok(files)
}

/// Turn explicitly declared entries into source files, keeping declaration order.
///
/// Relative entries resolve against `root`.
pub fn declared_sources(root: &Path, entries: &[PathBuf]) -> Vec<SourceFile> {
    entries
        .iter()
        .map(|entry| SourceFile::new(root, entry.clone()))
        .collect()
}
