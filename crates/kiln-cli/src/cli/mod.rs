//! Command-line interface definition for kiln.
//!
//! # Command Structure
//!
//! - `kiln build` - One-shot build of the project's artifacts
//! - `kiln dev` - Development server with watch mode and live reload
//! - `kiln check` - Validate configuration and print the compiled rule table
//! - `kiln init` - Write a `kiln.config.json` with the defaults

mod commands;
mod validation;

use clap::Parser;

pub use commands::{BuildArgs, CheckArgs, Command, DevArgs, InitArgs};
pub use validation::{parse_filename, parse_port};

/// kiln - rule-driven asset pipeline
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Rule-driven asset pipeline for scripts and stylesheets",
    long_about = "kiln classifies source files through an ordered rule table, runs them through\n\
                  transformer stages (JSX/ES down-levelling, Sass compilation, CSS extraction)\n\
                  and writes one script bundle plus extracted stylesheets. `kiln dev` serves\n\
                  the result with file watching and live reload."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Shows classification decisions, per-stage timings and cache reuse.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
