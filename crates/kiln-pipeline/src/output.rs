//! Atomic artifact writing.
//!
//! All artifacts of a build are committed together:
//!
//! 1. Every artifact is written to a temporary sibling (`<name>.kiln-tmp`)
//! 2. If all writes succeed, each existing artifact is moved to a backup
//!    (`<name>.kiln-bak`) and the temporary file is renamed into place
//! 3. If anything fails, renamed artifacts are restored from their backups
//!    and the temporary files are removed
//!
//! `rename()` is atomic on most file systems, so a reader (the browser hitting
//! the dev server, a deploy script) sees either the previous artifact or the
//! new one, never a truncated file. Destination names are normalised with
//! `path_clean` and must stay inside the output directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::aggregate::ArtifactSet;
use crate::{Error, Result};

const TEMP_SUFFIX: &str = "kiln-tmp";
const BACKUP_SUFFIX: &str = "kiln-bak";

/// Write every artifact in `set` under `out_dir`.
///
/// Returns the destination paths in artifact order (bundle first).
///
/// # Errors
///
/// [`Error::InvalidOutputPath`] when an artifact name escapes `out_dir` or two
/// artifacts share a destination, [`Error::WriteFailure`] on any I/O failure.
/// On error every destination holds what it held before the call.
pub fn write_artifacts(set: &ArtifactSet, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = validate_and_normalize_dir(out_dir)?;

    fs::create_dir_all(&dir).map_err(|e| {
        Error::WriteFailure(format!(
            "Failed to create output directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let operations = set
        .iter()
        .map(|artifact| {
            validate_output_path(&dir, &artifact.name).map(|path| (path, artifact.content.as_slice()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::with_capacity(operations.len());
    for (path, _) in &operations {
        if !seen.insert(path.as_path()) {
            return Err(Error::InvalidOutputPath(format!(
                "More than one artifact would be written to '{}'",
                path.display()
            )));
        }
    }

    write_files_atomic(&operations)?;

    tracing::debug!(dir = %dir.display(), files = operations.len(), "Wrote artifacts");
    Ok(operations.into_iter().map(|(path, _)| path).collect())
}

fn validate_and_normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();

    if cleaned.is_absolute() {
        return Ok(cleaned);
    }

    let cwd = std::env::current_dir().map_err(|e| {
        Error::InvalidOutputPath(format!("Failed to get current directory: {}", e))
    })?;
    Ok(cwd.join(&cleaned).clean())
}

/// Resolve `filename` under `base_dir`, rejecting anything that escapes it.
pub(crate) fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.is_empty() {
        return Err(Error::InvalidOutputPath("Filename is empty".to_string()));
    }
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();

    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

fn sibling_with_suffix(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    target.with_file_name(name)
}

fn temp_path_for(target: &Path) -> PathBuf {
    sibling_with_suffix(target, TEMP_SUFFIX)
}

/// An artifact already moved into place, with the file it replaced.
struct Committed {
    target: PathBuf,
    backup: Option<PathBuf>,
}

fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut temp_files = Vec::with_capacity(operations.len());

    // Phase 1: temporary files
    for (target_path, content) in operations {
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup_temp_files(&temp_files);
                Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = temp_path_for(target_path);
        fs::write(&temp_path, content).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to write temporary file '{}': {}",
                temp_path.display(),
                e
            ))
        })?;

        temp_files.push((temp_path, target_path.clone()));
    }

    // Phase 2: rename into place, keeping what was there
    let mut committed: Vec<Committed> = Vec::with_capacity(temp_files.len());
    for (temp_path, target_path) in &temp_files {
        if let Err(e) = commit_one(temp_path, target_path, &mut committed) {
            rollback(&committed);
            cleanup_temp_files(&temp_files);
            return Err(e);
        }
    }

    for entry in &committed {
        if let Some(backup) = &entry.backup {
            if let Err(e) = fs::remove_file(backup) {
                tracing::warn!("Failed to remove backup '{}': {}", backup.display(), e);
            }
        }
    }

    Ok(())
}

fn commit_one(temp_path: &Path, target_path: &Path, committed: &mut Vec<Committed>) -> Result<()> {
    let backup = if target_path.is_file() {
        let backup = sibling_with_suffix(target_path, BACKUP_SUFFIX);
        fs::rename(target_path, &backup).map_err(|e| {
            Error::WriteFailure(format!(
                "Failed to back up '{}': {}",
                target_path.display(),
                e
            ))
        })?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(temp_path, target_path) {
        if let Some(backup) = &backup {
            restore(backup, target_path);
        }
        return Err(Error::WriteFailure(format!(
            "Failed to rename '{}' to '{}': {}",
            temp_path.display(),
            target_path.display(),
            e
        )));
    }

    committed.push(Committed {
        target: target_path.to_path_buf(),
        backup,
    });
    Ok(())
}

/// Undo phase 2 in reverse order.
fn rollback(committed: &[Committed]) {
    for entry in committed.iter().rev() {
        match &entry.backup {
            Some(backup) => restore(backup, &entry.target),
            None => {
                if let Err(e) = fs::remove_file(&entry.target) {
                    tracing::warn!(
                        "Failed to remove partially committed '{}': {}",
                        entry.target.display(),
                        e
                    );
                }
            }
        }
    }
}

fn restore(backup: &Path, target: &Path) {
    if let Err(e) = fs::rename(backup, target) {
        tracing::error!(
            "Failed to restore '{}' from '{}': {}",
            target.display(),
            backup.display(),
            e
        );
    }
}

fn cleanup_temp_files(temp_files: &[(PathBuf, PathBuf)]) {
    for (temp_path, _) in temp_files {
        if temp_path.exists() {
            if let Err(e) = fs::remove_file(temp_path) {
                tracing::warn!(
                    "Failed to clean up temporary file '{}': {}",
                    temp_path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::OutputArtifact;
    use crate::transform::AssetKind;
    use tempfile::TempDir;

    fn artifact(name: &str, content: &str, kind: AssetKind) -> OutputArtifact {
        OutputArtifact {
            name: name.to_string(),
            kind,
            content: content.as_bytes().to_vec(),
        }
    }

    fn set(bundle: &str, styles: &[(&str, &str)]) -> ArtifactSet {
        ArtifactSet {
            bundle: artifact("index.bundle.js", bundle, AssetKind::Script),
            stylesheets: styles
                .iter()
                .map(|(name, css)| artifact(name, css, AssetKind::Style))
                .collect(),
        }
    }

    #[test]
    fn test_validate_output_path_normal() {
        let base = Path::new("/tmp/output");
        let result = validate_output_path(base, "index.js").unwrap();
        assert_eq!(result, Path::new("/tmp/output/index.js"));
    }

    #[test]
    fn test_validate_output_path_nested() {
        let base = Path::new("/tmp/output");
        let result = validate_output_path(base, "styles/base.css").unwrap();
        assert_eq!(result, Path::new("/tmp/output/styles/base.css"));
    }

    #[test]
    fn test_validate_output_path_traversal() {
        let base = Path::new("/tmp/output");
        for name in ["../etc/passwd", "safe/../../../../etc/passwd", "."] {
            let result = validate_output_path(base, name);
            assert!(
                matches!(result, Err(Error::InvalidOutputPath(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_output_path_null_byte() {
        let base = Path::new("/tmp/output");
        assert!(validate_output_path(base, "file\0name.js").is_err());
    }

    #[test]
    fn test_temp_path_keeps_full_name() {
        assert_eq!(
            temp_path_for(Path::new("/out/index.bundle.js")),
            Path::new("/out/index.bundle.js.kiln-tmp")
        );
    }

    #[test]
    fn test_write_artifacts() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("dist");
        let set = set("run();\n", &[("main.css", ".a{}")]);

        let written = write_artifacts(&set, &out).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(fs::read_to_string(out.join("index.bundle.js")).unwrap(), "run();\n");
        assert_eq!(fs::read_to_string(out.join("main.css")).unwrap(), ".a{}");
        let leftovers: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(TEMP_SUFFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_duplicate_destination_rejected() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("dist");
        write_artifacts(&set("old();\n", &[("theme.css", ".old{}")]), &out).unwrap();

        let clash = set("new();\n", &[("theme.css", ".a{}"), ("theme.css", ".b{}")]);
        let result = write_artifacts(&clash, &out);

        assert!(matches!(result, Err(Error::InvalidOutputPath(_))));
        assert_eq!(fs::read_to_string(out.join("index.bundle.js")).unwrap(), "old();\n");
        assert_eq!(fs::read_to_string(out.join("theme.css")).unwrap(), ".old{}");
    }

    #[test]
    fn test_failed_rename_restores_committed_artifacts() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("dist");
        write_artifacts(&set("old();\n", &[]), &out).unwrap();

        // A directory where a stylesheet should go makes its rename fail
        // after the bundle has already been moved into place
        fs::create_dir_all(out.join("blocked.css/inner")).unwrap();
        let result = write_artifacts(&set("new();\n", &[("fresh.css", ".f{}"), ("blocked.css", ".b{}")]), &out);

        assert!(matches!(result, Err(Error::WriteFailure(_))));
        assert_eq!(fs::read_to_string(out.join("index.bundle.js")).unwrap(), "old();\n");
        assert!(!out.join("fresh.css").exists());
        let leftovers: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(TEMP_SUFFIX) || name.ends_with(BACKUP_SUFFIX))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn test_escaping_artifact_leaves_previous_output() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("dist");
        write_artifacts(&set("old();\n", &[]), &out).unwrap();

        let bad = set("new();\n", &[("../escape.css", ".x{}")]);
        let result = write_artifacts(&bad, &out);

        assert!(matches!(result, Err(Error::InvalidOutputPath(_))));
        assert_eq!(fs::read_to_string(out.join("index.bundle.js")).unwrap(), "old();\n");
        assert!(!temp.path().join("escape.css").exists());
    }
}
