//! Command implementations for the kiln CLI.
//!
//! - [`build`] - One-shot build to the output directory
//! - [`dev`] - Development server with live reload
//! - [`check`] - Configuration validation
//! - [`init`] - Write a default kiln.config.json
//!
//! Each command provides an `execute` function that takes the parsed command
//! arguments and returns a Result.

pub mod build;
pub mod check;
pub mod dev;
pub mod init;
pub mod utils;

// Re-export execute functions for convenience
pub use build::execute as build_execute;
pub use check::execute as check_execute;
pub use dev::execute as dev_execute;
pub use init::execute as init_execute;
