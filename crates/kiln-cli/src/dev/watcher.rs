//! File system watcher with debouncing for development mode.
//!
//! The notify callback forwards raw paths over a channel; [`next_batch`]
//! classifies them and coalesces everything that arrives within the debounce
//! window into one [`ChangeBatch`].

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use kiln_pipeline::Pipeline;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::ProjectPaths;
use crate::error::{CliError, Result};

/// What a changed path means for the dev server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A file some rule covers, or a directory that may hold such files;
    /// triggers a rebuild
    Source,
    /// A file under the content base; triggers a plain reload
    Content,
    /// Anything else
    Ignored,
}

/// Decides which changes matter.
pub struct ChangeFilter {
    paths: ProjectPaths,
    pipeline: Arc<Pipeline>,
}

impl ChangeFilter {
    pub fn new(paths: ProjectPaths, pipeline: Arc<Pipeline>) -> Self {
        Self { paths, pipeline }
    }

    /// Classify one changed path.
    ///
    /// Moving or deleting a directory only reports the directory itself, so
    /// directory-like paths under the source tree count as sources.
    pub fn classify(&self, path: &Path) -> ChangeKind {
        if path.starts_with(&self.paths.output_dir) || is_hidden(path, &self.paths.root) {
            return ChangeKind::Ignored;
        }

        if self.paths.entries.is_empty() {
            if let Ok(relative) = path.strip_prefix(&self.paths.source_dir) {
                let table = self.pipeline.table();
                if table.classify(relative).is_some() {
                    return ChangeKind::Source;
                }
                if !relative.as_os_str().is_empty()
                    && !table.is_excluded(relative)
                    && is_directory_like(path)
                {
                    return ChangeKind::Source;
                }
            }
        } else if self
            .paths
            .entries
            .iter()
            .any(|entry| entry == path || entry.starts_with(path))
        {
            return ChangeKind::Source;
        }

        if path.starts_with(&self.paths.content_base) {
            ChangeKind::Content
        } else {
            ChangeKind::Ignored
        }
    }
}

/// An existing directory, or a vanished path without an extension.
fn is_directory_like(path: &Path) -> bool {
    path.is_dir() || (!path.exists() && path.extension().is_none())
}

fn is_hidden(path: &Path, root: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| match component {
        Component::Normal(name) => name.to_str().is_some_and(|n| n.starts_with('.')),
        _ => false,
    })
}

/// Changes coalesced within one debounce window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub sources: Vec<PathBuf>,
    pub content: Vec<PathBuf>,
}

impl ChangeBatch {
    fn push(&mut self, kind: ChangeKind, path: PathBuf) {
        let list = match kind {
            ChangeKind::Source => &mut self.sources,
            ChangeKind::Content => &mut self.content,
            ChangeKind::Ignored => return,
        };
        if !list.contains(&path) {
            list.push(path);
        }
    }

    pub fn needs_rebuild(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.content.is_empty()
    }
}

/// Wait for the next relevant change, then keep collecting until no event
/// arrives for `debounce`.
///
/// Returns `None` once the watcher is gone.
pub async fn next_batch(
    rx: &mut mpsc::Receiver<PathBuf>,
    filter: &ChangeFilter,
    debounce: Duration,
) -> Option<ChangeBatch> {
    let mut batch = ChangeBatch::default();

    while batch.is_empty() {
        let path = rx.recv().await?;
        batch.push(filter.classify(&path), path);
    }

    while let Ok(Some(path)) = tokio::time::timeout(debounce, rx.recv()).await {
        batch.push(filter.classify(&path), path);
    }

    Some(batch)
}

/// Recursive watcher over a set of roots.
#[derive(Debug)]
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    roots: Vec<PathBuf>,
}

impl FileWatcher {
    /// Start watching `roots`, forwarding changed paths to the returned receiver.
    ///
    /// # Errors
    ///
    /// `FileNotFound` if a root doesn't exist, `Watch` if notify fails.
    pub fn new(roots: Vec<PathBuf>) -> Result<(Self, mpsc::Receiver<PathBuf>)> {
        if let Some(missing) = roots.iter().find(|root| !root.exists()) {
            return Err(CliError::FileNotFound(missing.clone()));
        }

        let (tx, rx) = mpsc::channel(256);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("File watcher error: {e}");
                    return;
                }
            };
            if !is_content_change(&event.kind) {
                return;
            }
            for path in event.paths {
                // Receiver dropped means the dev loop is shutting down
                if tx.blocking_send(path).is_err() {
                    return;
                }
            }
        })?;

        for root in &roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
            tracing::debug!(root = %root.display(), "Watching");
        }

        Ok((
            Self {
                _watcher: watcher,
                roots,
            },
            rx,
        ))
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KilnConfig;

    fn filter(config: KilnConfig) -> ChangeFilter {
        let pipeline = Arc::new(config.pipeline().unwrap());
        ChangeFilter::new(config.resolve(Path::new("/project")), pipeline)
    }

    #[test]
    fn test_classify_discovery_mode() {
        let filter = filter(KilnConfig::default());

        assert_eq!(
            filter.classify(Path::new("/project/src/app.js")),
            ChangeKind::Source
        );
        assert_eq!(
            filter.classify(Path::new("/project/src/styles/main.scss")),
            ChangeKind::Source
        );
        assert_eq!(
            filter.classify(Path::new("/project/src/notes.txt")),
            ChangeKind::Ignored
        );
        assert_eq!(
            filter.classify(Path::new("/project/src/node_modules/lib/index.js")),
            ChangeKind::Ignored
        );
        assert_eq!(
            filter.classify(Path::new("/project/public/index.html")),
            ChangeKind::Content
        );
        assert_eq!(
            filter.classify(Path::new("/project/dist/index.bundle.js")),
            ChangeKind::Ignored
        );
    }

    #[test]
    fn test_classify_moved_source_directory() {
        let filter = filter(KilnConfig::default());

        // Both ends of `mv src/components src/widgets`
        assert_eq!(
            filter.classify(Path::new("/project/src/components")),
            ChangeKind::Source
        );
        assert_eq!(
            filter.classify(Path::new("/project/src/widgets")),
            ChangeKind::Source
        );
        assert_eq!(
            filter.classify(Path::new("/project/src/node_modules/lib")),
            ChangeKind::Ignored
        );
        assert_eq!(
            filter.classify(Path::new("/project/src/notes.txt")),
            ChangeKind::Ignored
        );
    }

    #[test]
    fn test_classify_existing_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src/ui.v2")).unwrap();

        let config = KilnConfig::default();
        let pipeline = Arc::new(config.pipeline().unwrap());
        let filter = ChangeFilter::new(config.resolve(temp.path()), pipeline);

        assert_eq!(
            filter.classify(&temp.path().join("src/ui.v2")),
            ChangeKind::Source
        );
    }

    #[test]
    fn test_classify_hidden_files() {
        let filter = filter(KilnConfig::default());
        assert_eq!(
            filter.classify(Path::new("/project/src/.app.js.swp")),
            ChangeKind::Ignored
        );
        assert_eq!(
            filter.classify(Path::new("/project/public/.DS_Store")),
            ChangeKind::Ignored
        );
    }

    #[test]
    fn test_classify_declared_entries() {
        let filter = filter(KilnConfig {
            entries: vec![PathBuf::from("lib/a.js")],
            ..KilnConfig::default()
        });
        assert_eq!(
            filter.classify(Path::new("/project/lib/a.js")),
            ChangeKind::Source
        );
        assert_eq!(
            filter.classify(Path::new("/project/lib/b.js")),
            ChangeKind::Ignored
        );
        // The directory holding an entry was moved away
        assert_eq!(
            filter.classify(Path::new("/project/lib")),
            ChangeKind::Source
        );
    }

    #[tokio::test]
    async fn test_next_batch_coalesces() {
        let filter = filter(KilnConfig::default());
        let (tx, mut rx) = mpsc::channel(16);

        tx.send(PathBuf::from("/project/src/notes.txt")).await.unwrap();
        tx.send(PathBuf::from("/project/src/a.js")).await.unwrap();
        tx.send(PathBuf::from("/project/src/a.js")).await.unwrap();
        tx.send(PathBuf::from("/project/public/index.html")).await.unwrap();

        let batch = next_batch(&mut rx, &filter, Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(batch.sources, vec![PathBuf::from("/project/src/a.js")]);
        assert_eq!(batch.content, vec![PathBuf::from("/project/public/index.html")]);
        assert!(batch.needs_rebuild());

        drop(tx);
        assert!(next_batch(&mut rx, &filter, Duration::from_millis(20)).await.is_none());
    }

    #[test]
    fn test_watcher_missing_root() {
        let result = FileWatcher::new(vec![PathBuf::from("/definitely/not/here")]);
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }
}
