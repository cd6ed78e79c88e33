//! Development server module.
//!
//! - Live reload via Server-Sent Events
//! - Artifacts served from memory, content base from disk
//! - Debounced file watching with generation-ordered rebuilds
//! - Error overlay in browser

pub mod builder;
pub mod config;
pub mod error_overlay;
pub mod server;
pub mod state;
pub mod watcher;

// Re-exports
pub use builder::{DevBuilder, RebuildOutcome};
pub use config::DevConfig;
pub use server::DevServer;
pub use state::{ArtifactCache, BuildStatus, DevServerState, SharedState};
pub use watcher::{ChangeBatch, ChangeFilter, ChangeKind, FileWatcher};

use serde::{Deserialize, Serialize};

/// Events pushed to connected browsers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DevEvent {
    /// Rebuild started
    BuildStarted { generation: u64 },

    /// Rebuild committed; clients reload
    BuildCompleted { generation: u64, duration_ms: u64 },

    /// Rebuild failed; clients show the error overlay
    BuildFailed { generation: u64, error: String },

    /// A content base file changed; clients reload without a rebuild
    Reload,

    /// Client connected
    ClientConnected { id: usize },
}
