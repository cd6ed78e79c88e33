//! Kiln CLI - rule-driven asset pipeline with a live-reloading dev server.
//!
//! This crate wraps [`kiln_pipeline`] in a command-line interface: layered
//! configuration, one-shot builds, and a development server that watches the
//! source tree and pushes rebuilds to the browser.
//!
//! # Architecture
//!
//! - [`cli`] - Argument parsing with clap
//! - [`config`] - `kiln.config.json` + `KILN_*` environment + CLI flags, via figment
//! - [`commands`] - `build`, `dev`, `check` and `init`
//! - [`dev`] - Watcher, rebuild generations and the axum server
//! - [`error`] - Error types with actionable hints
//! - [`logger`] - Structured logging with tracing
//! - [`ui`] - Terminal output helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{BuildError, CliError, ConfigError, Result, ResultExt};
