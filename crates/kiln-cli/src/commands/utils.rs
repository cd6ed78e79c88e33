//! Shared utilities for command implementations.
//!
//! - Project root resolution
//! - Output directory validation, pruning and creation

use crate::error::{BuildError, CliError, Result, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve a path relative to a working directory.
///
/// If the path is absolute, returns it unchanged. Otherwise, joins it with
/// the working directory.
pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Get the current working directory.
///
/// # Errors
///
/// Returns I/O error if current directory cannot be determined.
pub fn get_cwd() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to get current directory: {}", e),
        ))
    })
}

/// Resolve the project root from `--cwd`, falling back to the process cwd.
///
/// # Errors
///
/// `InvalidArgument` if an explicit directory doesn't exist or isn't a
/// directory.
pub fn resolve_project_root(explicit_cwd: Option<&Path>) -> Result<PathBuf> {
    let current_dir = get_cwd()?;

    let Some(cwd_path) = explicit_cwd else {
        return Ok(current_dir);
    };

    let absolute = resolve_path(cwd_path, &current_dir);
    if !absolute.exists() {
        return Err(CliError::InvalidArgument(format!(
            "Specified --cwd directory does not exist: {}",
            absolute.display()
        )));
    }
    if !absolute.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Specified --cwd is not a directory: {}",
            absolute.display()
        )));
    }

    tracing::debug!(root = %absolute.display(), "Using project root from --cwd");
    Ok(absolute)
}

/// Validates that the output directory is safe to write to.
///
/// The directory must live inside the project (or be a sibling of it) and
/// must not be a system location.
///
/// # Errors
///
/// Returns `OutputNotWritable` if the directory is unsafe.
pub fn validate_output_dir(out_dir: &Path, cwd: &Path) -> Result<()> {
    let resolved_out_dir = resolve_path(out_dir, cwd);
    let canonical_out = canonicalize_lenient(&resolved_out_dir)?;

    let canonical_cwd = cwd.canonicalize()?;

    let is_within_project = canonical_out.starts_with(&canonical_cwd);
    let is_sibling = canonical_out
        .parent()
        .and_then(|p| canonical_cwd.parent().map(|c| p == c))
        .unwrap_or(false);

    if canonical_out == canonical_cwd || (!is_within_project && !is_sibling) {
        return Err(CliError::Build(BuildError::OutputNotWritable(
            resolved_out_dir,
        )));
    }

    const DANGEROUS_PATHS: &[&str] = &[
        "/bin",
        "/boot",
        "/dev",
        "/etc",
        "/lib",
        "/lib64",
        "/proc",
        "/sbin",
        "/sys",
        "/usr/bin",
        "/usr/lib",
        "/usr/sbin",
        "/var/log",
    ];

    let out_str = canonical_out.to_string_lossy();
    for dangerous in DANGEROUS_PATHS {
        if out_str.starts_with(dangerous) {
            return Err(CliError::Build(BuildError::Custom(format!(
                "Refusing to write to system directory: {}",
                out_str
            ))));
        }
    }

    Ok(())
}

/// Canonicalize the longest existing ancestor and re-append the rest.
fn canonicalize_lenient(path: &Path) -> Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => {
                return Err(CliError::Build(BuildError::OutputNotWritable(
                    path.to_path_buf(),
                )));
            }
        }
    }

    let mut canonical = existing.canonicalize()?;
    canonical.extend(missing.iter().rev());
    Ok(canonical)
}

/// Remove everything under `out_dir` except the files in `keep`.
///
/// Directories leading to a kept file are descended into rather than removed.
/// Returns the number of entries removed.
///
/// # Errors
///
/// Returns I/O errors if directory operations fail.
pub fn prune_output_dir(out_dir: &Path, keep: &[PathBuf]) -> Result<usize> {
    let mut removed = 0;
    prune_dir(out_dir, keep, &mut removed)?;
    Ok(removed)
}

fn prune_dir(dir: &Path, keep: &[PathBuf], removed: &mut usize) -> Result<()> {
    for entry in fs::read_dir(dir).with_path(dir)? {
        let path = entry?.path();
        if keep.contains(&path) {
            continue;
        }

        if path.is_dir() {
            if keep.iter().any(|kept| kept.starts_with(&path)) {
                prune_dir(&path, keep, removed)?;
                continue;
            }
            fs::remove_dir_all(&path).with_path(&path)?;
        } else {
            fs::remove_file(&path).with_path(&path)?;
        }
        *removed += 1;
    }
    Ok(())
}

/// Delete artifacts a previous build wrote that `current` no longer contains.
///
/// Both lists hold paths returned by `write_artifacts`. Files already gone
/// are not an error.
pub fn remove_stale_artifacts(previous: &[PathBuf], current: &[PathBuf]) -> usize {
    let mut removed = 0;
    for stale in previous.iter().filter(|path| !current.contains(path)) {
        match fs::remove_file(stale) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %stale.display(), "Failed to remove stale artifact: {e}");
            }
        }
    }
    removed
}

/// Ensure an output directory exists, creating it if necessary.
pub fn ensure_output_dir(out_dir: &Path) -> Result<()> {
    if !out_dir.exists() {
        fs::create_dir_all(out_dir)?;
    } else if !out_dir.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Output path exists but is not a directory: {}",
            out_dir.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_path() {
        let cwd = PathBuf::from("/some/dir");
        assert_eq!(
            resolve_path(Path::new("/absolute/path"), &cwd),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            resolve_path(Path::new("relative/path"), &cwd),
            PathBuf::from("/some/dir/relative/path")
        );
    }

    #[test]
    fn test_resolve_project_root_explicit() {
        let temp = TempDir::new().unwrap();
        let root = resolve_project_root(Some(temp.path())).unwrap();
        assert_eq!(root, temp.path());

        let missing = temp.path().join("missing");
        assert!(matches!(
            resolve_project_root(Some(&missing)),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_output_dir() {
        let temp = TempDir::new().unwrap();
        assert!(validate_output_dir(Path::new("dist"), temp.path()).is_ok());
        assert!(validate_output_dir(Path::new("build/out"), temp.path()).is_ok());
        assert!(validate_output_dir(Path::new("/etc"), temp.path()).is_err());
        assert!(validate_output_dir(Path::new("."), temp.path()).is_err());
    }

    #[test]
    fn test_prune_output_dir_keeps_artifacts() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("dist");
        fs::create_dir_all(out.join("old")).unwrap();
        fs::create_dir_all(out.join("styles")).unwrap();
        File::create(out.join("stale.css")).unwrap();
        File::create(out.join("old/app.js")).unwrap();
        File::create(out.join("styles/gone.css")).unwrap();
        File::create(out.join("styles/base.css")).unwrap();
        File::create(out.join("index.bundle.js")).unwrap();

        let keep = vec![out.join("index.bundle.js"), out.join("styles/base.css")];
        let removed = prune_output_dir(&out, &keep).unwrap();

        assert_eq!(removed, 3);
        assert!(out.join("index.bundle.js").exists());
        assert!(out.join("styles/base.css").exists());
        assert!(!out.join("styles/gone.css").exists());
        assert!(!out.join("old").exists());
        assert!(!out.join("stale.css").exists());
    }

    #[test]
    fn test_prune_missing_dir_reports_path() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("dist");
        assert!(matches!(
            prune_output_dir(&missing, &[]),
            Err(CliError::FileNotFound(path)) if path == missing
        ));
    }

    #[test]
    fn test_remove_stale_artifacts() {
        let temp = TempDir::new().unwrap();
        let kept = temp.path().join("main.css");
        let stale = temp.path().join("theme.css");
        File::create(&kept).unwrap();
        File::create(&stale).unwrap();

        let previous = vec![kept.clone(), stale.clone(), temp.path().join("never.css")];
        let removed = remove_stale_artifacts(&previous, std::slice::from_ref(&kept));

        assert_eq!(removed, 1);
        assert!(kept.exists());
        assert!(!stale.exists());
    }

    #[test]
    fn test_ensure_output_dir_rejects_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("dist");
        File::create(&file).unwrap();
        assert!(ensure_output_dir(&file).is_err());
    }
}
