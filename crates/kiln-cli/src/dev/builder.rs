//! Development mode builder.
//!
//! Every rebuild is numbered. Builds may overlap; a build's result is only
//! committed (written to disk, swapped into memory, announced to clients)
//! if no newer build has been requested since it started. Commits are
//! serialized by a lock so the committed artifacts are always one complete
//! build. Artifacts the previous commit wrote and the new one doesn't are
//! removed from disk.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use kiln_pipeline::{BuildOutput, Pipeline, write_artifacts};
use tokio::sync::Mutex;

use crate::commands::utils;
use crate::config::ProjectPaths;
use crate::dev::{ArtifactCache, DevEvent, SharedState};
use crate::error::{CliError, Result};

/// What happened to one rebuild request.
#[derive(Debug)]
pub enum RebuildOutcome {
    /// The build's artifacts are now being served
    Committed { generation: u64, duration: Duration },
    /// The build failed and its error is being shown
    Failed { generation: u64, error: CliError },
    /// A newer build was requested before this one finished
    Superseded { generation: u64 },
}

impl RebuildOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            RebuildOutcome::Committed { generation, .. }
            | RebuildOutcome::Failed { generation, .. }
            | RebuildOutcome::Superseded { generation } => *generation,
        }
    }
}

/// Runs pipeline builds for the dev server and commits their results.
pub struct DevBuilder {
    pipeline: Arc<Pipeline>,
    paths: ProjectPaths,
    state: SharedState,
    latest: AtomicU64,
    /// Held while committing; holds the paths of the last committed artifacts.
    committed: Mutex<Vec<PathBuf>>,
}

impl DevBuilder {
    pub fn new(pipeline: Arc<Pipeline>, paths: ProjectPaths, state: SharedState) -> Self {
        Self {
            pipeline,
            paths,
            state,
            latest: AtomicU64::new(0),
            committed: Mutex::new(Vec::new()),
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Reserve the next generation number. Any build holding an older one
    /// will be discarded at commit.
    pub fn next_generation(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Request a rebuild and run it to completion.
    pub async fn rebuild(&self) -> RebuildOutcome {
        self.run(self.next_generation()).await
    }

    /// Run the build for an already reserved `generation`.
    pub async fn run(&self, generation: u64) -> RebuildOutcome {
        self.state.start_build(generation);
        self.state.broadcast(&DevEvent::BuildStarted { generation });

        let result = self.build().await;
        self.commit(generation, result).await
    }

    /// Discover the sources and run the pipeline on the blocking pool.
    pub async fn build(&self) -> Result<BuildOutput> {
        let pipeline = Arc::clone(&self.pipeline);
        let paths = self.paths.clone();

        tokio::task::spawn_blocking(move || -> Result<BuildOutput> {
            let sources = paths.sources(pipeline.table())?;
            Ok(pipeline.build(&sources)?)
        })
        .await
        .map_err(|e| CliError::Custom(format!("Build task panicked: {e}")))?
    }

    /// Commit the result of build `generation` unless it has been superseded.
    pub async fn commit(&self, generation: u64, result: Result<BuildOutput>) -> RebuildOutcome {
        let mut committed = self.committed.lock().await;

        if generation != self.latest_generation() {
            tracing::debug!(generation, latest = self.latest_generation(), "Discarding superseded build");
            return RebuildOutcome::Superseded { generation };
        }

        let output = match result {
            Ok(output) => output,
            Err(error) => return self.fail(generation, error),
        };

        let written = match write_artifacts(&output.artifacts, &self.paths.output_dir) {
            Ok(written) => written,
            Err(error) => return self.fail(generation, error.into()),
        };
        let removed = utils::remove_stale_artifacts(&committed, &written);
        if removed > 0 {
            tracing::debug!(generation, removed, "Removed stale artifacts");
        }
        *committed = written;

        let duration_ms = output.duration.as_millis() as u64;
        self.state.replace_cache(ArtifactCache::from(&output.artifacts));
        self.state.complete_build(generation, duration_ms);
        self.state.broadcast(&DevEvent::BuildCompleted {
            generation,
            duration_ms,
        });

        tracing::info!(
            generation,
            processed = output.stats.processed,
            reused = output.stats.reused,
            duration_ms,
            "Committed build"
        );
        RebuildOutcome::Committed {
            generation,
            duration: output.duration,
        }
    }

    fn fail(&self, generation: u64, error: CliError) -> RebuildOutcome {
        let message = error.to_string();
        self.state.fail_build(generation, message.clone());
        self.state.broadcast(&DevEvent::BuildFailed {
            generation,
            error: message,
        });
        RebuildOutcome::Failed { generation, error }
    }
}
