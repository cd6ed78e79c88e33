use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::validation::{parse_filename, parse_port};

/// Available kiln subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the project's artifacts once
    ///
    /// Discovers sources, runs each through the stages of the first matching
    /// rule and writes the script bundle and extracted stylesheets.
    Build(BuildArgs),

    /// Start the development server with watch mode
    ///
    /// Serves the artifacts from memory, rebuilds incrementally when sources
    /// change and reloads connected browsers.
    Dev(DevArgs),

    /// Validate configuration and print the compiled rule table
    Check(CheckArgs),

    /// Write a kiln.config.json with the default settings
    Init(InitArgs),
}

/// Arguments for the build command
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Path to the configuration file
    ///
    /// Defaults to kiln.config.json in the working directory, if present.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory for artifacts
    ///
    /// Overrides `outputDirectory`. Created if it doesn't exist.
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// File name of the script bundle
    ///
    /// Overrides `outputFilename`. Must be a bare file name.
    ///
    /// Example: --filename app.js
    #[arg(short, long, value_parser = parse_filename, value_name = "NAME")]
    pub filename: Option<String>,

    /// Working directory for the build
    ///
    /// All relative paths in the configuration are resolved against this
    /// directory. Defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Clean output directory before build
    ///
    /// Removes everything in the output directory first so no stale
    /// stylesheets from earlier builds remain.
    #[arg(long)]
    pub clean: bool,

    /// Minify extracted CSS
    #[arg(long)]
    pub minify: bool,
}

/// Arguments for the dev command (development server)
#[derive(Args, Debug, Default)]
pub struct DevArgs {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Port for the development server
    ///
    /// Overrides `serverPort`. The server binds exactly this port and exits
    /// with an error if it is already in use.
    #[arg(short, long, value_parser = parse_port, value_name = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    ///
    /// Overrides `host`. Use 0.0.0.0 to accept connections from other machines.
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Disable file watching
    ///
    /// Builds once and serves the result without rebuilding on changes.
    #[arg(long)]
    pub no_watch: bool,

    /// Open browser automatically on server start
    #[arg(long)]
    pub open: bool,

    /// Working directory for the dev server
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

/// Arguments for the check command (configuration validation)
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Working directory containing the project
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Print the JSON Schema of kiln.config.json to stdout and exit
    #[arg(long)]
    pub schema: bool,
}

/// Arguments for the init command
#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Overwrite an existing kiln.config.json
    #[arg(short, long)]
    pub force: bool,

    /// Directory to create the config in
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}
