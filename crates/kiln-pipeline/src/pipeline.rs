//! Build orchestration.
//!
//! One build moves through `classify → transform → aggregate`. Transformation
//! runs on the rayon pool with results kept in input order; aggregation is
//! serial. Successful outputs are kept in a [`ProcessCache`] so the next build
//! only reprocesses files whose bytes (or governing rule) changed.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rustc_hash::FxHashSet as HashSet;

use crate::aggregate::{ArtifactSet, OutputOptions, aggregate};
use crate::cache::{ProcessCache, hash_source};
use crate::process::{SourceFile, TransformedOutput, process_source};
use crate::rule::{Rule, RuleTable};
use crate::{Error, Result};

/// Counters for one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Files run through their rule's stages.
    pub processed: usize,
    /// Files whose cached output was reused.
    pub reused: usize,
    /// Files no rule governs.
    pub skipped: usize,
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub artifacts: ArtifactSet,
    pub stats: BuildStats,
    pub duration: Duration,
}

/// Holds the compiled rule table, artifact naming and the process cache.
#[derive(Debug)]
pub struct Pipeline {
    table: RuleTable,
    options: OutputOptions,
    cache: ProcessCache,
}

impl Pipeline {
    pub fn new(table: RuleTable, options: OutputOptions) -> Self {
        Self {
            table,
            options,
            cache: ProcessCache::new(),
        }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn options(&self) -> &OutputOptions {
        &self.options
    }

    pub fn cache(&self) -> &ProcessCache {
        &self.cache
    }

    /// Rule governing `file`, if any.
    pub fn classify(&self, file: &SourceFile) -> Option<&Rule> {
        self.table.classify(&file.relative)
    }

    /// Build `sources` into an [`ArtifactSet`].
    ///
    /// # Errors
    ///
    /// When one or more files fail, every failure is logged and the first one
    /// in input order is returned. Outputs of the files that succeeded remain
    /// cached for the next build.
    pub fn build(&self, sources: &[SourceFile]) -> Result<BuildOutput> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        let classified: Vec<(&SourceFile, &Rule)> = sources
            .iter()
            .filter_map(|file| match self.classify(file) {
                Some(rule) => Some((file, rule)),
                None => {
                    tracing::debug!(file = %file.relative.display(), "No rule matches, skipping");
                    stats.skipped += 1;
                    None
                }
            })
            .collect();

        tracing::debug!(
            files = classified.len(),
            skipped = stats.skipped,
            "Classified sources"
        );

        let results: Vec<Result<(Arc<TransformedOutput>, bool)>> = classified
            .par_iter()
            .map(|(file, rule)| self.process_cached(file, rule))
            .collect();

        let live: HashSet<_> = classified.iter().map(|(file, _)| file.path.clone()).collect();
        let pruned = self.cache.retain(&live);
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned stale cache entries");
        }

        let mut outputs = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok((output, reused)) => {
                    if reused {
                        stats.reused += 1;
                    } else {
                        stats.processed += 1;
                    }
                    outputs.push(output);
                }
                Err(err) => failures.push(err),
            }
        }

        if !failures.is_empty() {
            for failure in &failures {
                tracing::error!("{failure}");
            }
            return Err(failures.swap_remove(0));
        }

        let artifacts = aggregate(&outputs, &self.options)?;
        let duration = start.elapsed();

        tracing::info!(
            processed = stats.processed,
            reused = stats.reused,
            skipped = stats.skipped,
            duration_ms = duration.as_millis() as u64,
            "Build finished"
        );

        Ok(BuildOutput {
            artifacts,
            stats,
            duration,
        })
    }

    fn process_cached(&self, file: &SourceFile, rule: &Rule) -> Result<(Arc<TransformedOutput>, bool)> {
        let source = read_source(&file.path)?;
        let hash = hash_source(&source);

        if let Some(hit) = self.cache.lookup(&file.path, &hash, rule.index()) {
            tracing::trace!(file = %file.relative.display(), "Reusing cached output");
            return Ok((hit, true));
        }

        let output = Arc::new(process_source(file, rule, source, hash)?);
        self.cache
            .store(file.path.clone(), rule.index(), Arc::clone(&output));
        Ok((output, false))
    }
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}
