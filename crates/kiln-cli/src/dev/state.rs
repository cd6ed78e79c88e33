//! Shared state for the development server.
//!
//! Holds the last committed artifacts, the build status and the SSE client
//! registry behind parking_lot locks.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use kiln_pipeline::{ArtifactSet, AssetKind};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::dev::DevEvent;

/// Build status tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// No build has been performed yet
    NotStarted,
    /// A build is running
    InProgress { generation: u64, started_at: Instant },
    /// The last committed build succeeded
    Success { generation: u64, duration_ms: u64 },
    /// The latest build failed
    Failed { generation: u64, error: String },
}

impl BuildStatus {
    /// Error message if the latest build failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            BuildStatus::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// One artifact held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub content: Arc<[u8]>,
    pub content_type: &'static str,
    pub kind: AssetKind,
}

/// In-memory copy of the committed artifacts, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct ArtifactCache {
    files: HashMap<String, CachedArtifact>,
    bundle: Option<String>,
    stylesheets: Vec<String>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&CachedArtifact> {
        self.files.get(name)
    }

    /// Name of the script bundle, once a build has been committed.
    pub fn bundle_name(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    /// Stylesheet names in emission order.
    pub fn stylesheet_names(&self) -> &[String] {
        &self.stylesheets
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl From<&ArtifactSet> for ArtifactCache {
    fn from(set: &ArtifactSet) -> Self {
        let files = set
            .iter()
            .map(|artifact| {
                (
                    artifact.name.clone(),
                    CachedArtifact {
                        content: Arc::from(artifact.content.as_slice()),
                        content_type: artifact.kind.content_type(),
                        kind: artifact.kind,
                    },
                )
            })
            .collect();

        Self {
            files,
            bundle: Some(set.bundle.name.clone()),
            stylesheets: set.stylesheets.iter().map(|s| s.name.clone()).collect(),
        }
    }
}

/// Client connection tracker for Server-Sent Events.
pub type ClientRegistry = RwLock<HashMap<usize, mpsc::Sender<String>>>;

/// Shared development server state.
pub struct DevServerState {
    status: RwLock<BuildStatus>,
    cache: RwLock<Arc<ArtifactCache>>,
    clients: ClientRegistry,
    next_client_id: AtomicUsize,
    content_base: PathBuf,
}

impl DevServerState {
    /// Create new dev server state serving `content_base` as a static fallback.
    pub fn new(content_base: PathBuf) -> Self {
        Self {
            status: RwLock::new(BuildStatus::NotStarted),
            cache: RwLock::new(Arc::new(ArtifactCache::new())),
            clients: RwLock::new(HashMap::new()),
            next_client_id: AtomicUsize::new(0),
            content_base,
        }
    }

    pub fn start_build(&self, generation: u64) {
        *self.status.write() = BuildStatus::InProgress {
            generation,
            started_at: Instant::now(),
        };
    }

    pub fn complete_build(&self, generation: u64, duration_ms: u64) {
        *self.status.write() = BuildStatus::Success {
            generation,
            duration_ms,
        };
    }

    pub fn fail_build(&self, generation: u64, error: String) {
        *self.status.write() = BuildStatus::Failed { generation, error };
    }

    pub fn status(&self) -> BuildStatus {
        self.status.read().clone()
    }

    /// Swap in a new artifact cache. Readers keep the old one until they drop it.
    pub fn replace_cache(&self, cache: ArtifactCache) {
        *self.cache.write() = Arc::new(cache);
    }

    pub fn cache(&self) -> Arc<ArtifactCache> {
        Arc::clone(&self.cache.read())
    }

    pub fn content_base(&self) -> &PathBuf {
        &self.content_base
    }

    /// Register a new SSE client.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(100);
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Send an event to every connected client.
    ///
    /// Closed clients are dropped. A client whose queue is full misses the
    /// event rather than stalling the others.
    pub fn broadcast(&self, event: &DevEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize dev event: {e}");
                return;
            }
        };

        let mut closed = Vec::new();
        for (id, tx) in self.clients.read().iter() {
            match tx.try_send(json.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!(client = id, "SSE queue full, dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        if !closed.is_empty() {
            let mut clients = self.clients.write();
            for id in closed {
                clients.remove(&id);
            }
        }
    }
}

/// Shared state handle for passing around the application.
pub type SharedState = Arc<DevServerState>;
