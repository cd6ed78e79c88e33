//! Process cache for incremental builds.
//!
//! Keyed by absolute source path. An entry is reused only when both the BLAKE3
//! hash of the current source bytes and the index of the governing rule match
//! what was recorded, so edits and rule changes both force reprocessing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::process::TransformedOutput;

/// BLAKE3 hash of a source file's bytes.
pub fn hash_source(bytes: &[u8]) -> [u8; 32] {
    *blake3::hash(bytes).as_bytes()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    rule: usize,
    output: Arc<TransformedOutput>,
}

/// Thread-safe map from source path to its last successful output.
#[derive(Debug, Default)]
pub struct ProcessCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl ProcessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached output for `path` if it was produced from `hash` by rule `rule`.
    pub fn lookup(&self, path: &Path, hash: &[u8; 32], rule: usize) -> Option<Arc<TransformedOutput>> {
        let entries = self.entries.read();
        let entry = entries.get(path)?;
        (entry.rule == rule && &entry.output.source_hash == hash).then(|| Arc::clone(&entry.output))
    }

    pub fn store(&self, path: PathBuf, rule: usize, output: Arc<TransformedOutput>) {
        self.entries.write().insert(path, CacheEntry { rule, output });
    }

    /// Drop every entry whose path is not in `live`. Returns how many were removed.
    pub fn retain(&self, live: &HashSet<PathBuf>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|path, _| live.contains(path));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
