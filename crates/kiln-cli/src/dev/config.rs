//! Development server configuration.
//!
//! Extends the base KilnConfig with the resolved socket address and watch
//! settings.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::DevArgs;
use crate::commands::utils;
use crate::config::{ConfigOverrides, KilnConfig, ProjectPaths};
use crate::error::{ConfigError, Result};

/// Development server configuration.
#[derive(Debug, Clone)]
pub struct DevConfig {
    /// Base configuration (file, env and CLI merged)
    pub base: KilnConfig,

    /// Absolute project locations
    pub paths: ProjectPaths,

    /// Exact address the server binds; there is no port fallback
    pub addr: SocketAddr,

    /// Rebuild on change
    pub watch: bool,

    /// Coalescing window for change events
    pub debounce: Duration,

    /// Open browser automatically on start
    pub open: bool,
}

impl DevConfig {
    /// Load configuration for `kiln dev`.
    ///
    /// # Errors
    ///
    /// Configuration errors, or `InvalidValue` if `host:serverPort` doesn't
    /// resolve to a socket address.
    pub fn from_args(args: &DevArgs) -> Result<Self> {
        let root = utils::resolve_project_root(args.cwd.as_deref())?;
        // notify reports canonical paths
        let root = root.canonicalize().unwrap_or(root);

        let base = KilnConfig::load(&root, args.config.as_deref(), &ConfigOverrides::from(args))?;
        Self::from_config(base, root, args.open)
    }

    /// Build a DevConfig from already-loaded configuration.
    pub fn from_config(base: KilnConfig, root: PathBuf, open: bool) -> Result<Self> {
        base.validate()?;
        let addr = resolve_addr(&base.host, base.server_port)?;

        Ok(Self {
            paths: base.resolve(&root),
            addr,
            watch: base.watch_enabled,
            debounce: Duration::from_millis(base.debounce_ms),
            open,
            base,
        })
    }

    /// Get the server URL.
    pub fn server_url(&self) -> String {
        let host = if self.addr.ip().is_unspecified() {
            "localhost".to_string()
        } else if self.addr.is_ipv6() {
            format!("[{}]", self.addr.ip())
        } else {
            self.addr.ip().to_string()
        };
        format!("http://{}:{}", host, self.addr.port())
    }

    /// Directories the watcher covers.
    ///
    /// The source directory (or each declared entry's parent) plus the
    /// content base when it exists.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = if self.paths.entries.is_empty() {
            vec![self.paths.source_dir.clone()]
        } else {
            self.paths
                .entries
                .iter()
                .filter_map(|entry| entry.parent().map(PathBuf::from))
                .collect()
        };
        if self.paths.content_base.is_dir() {
            roots.push(self.paths.content_base.clone());
        }

        roots.sort();
        roots.dedup();
        // Nested roots are covered by their ancestor's recursive watch
        let mut covered: Vec<PathBuf> = Vec::with_capacity(roots.len());
        for root in roots {
            if !covered.iter().any(|parent| root.starts_with(parent)) {
                covered.push(root);
            }
        }
        covered
    }
}

fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let invalid = || ConfigError::InvalidValue {
        field: "host".to_string(),
        value: host.to_string(),
        hint: "Use an IP address such as 127.0.0.1 or a resolvable host name".to_string(),
    };

    (host, port)
        .to_socket_addrs()
        .map_err(|_| invalid())?
        .next()
        .ok_or_else(|| invalid().into())
}
