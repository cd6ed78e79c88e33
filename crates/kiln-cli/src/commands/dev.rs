//! Development server command implementation.
//!
//! Orchestrates the dev server lifecycle:
//! - Initial build
//! - HTTP server with SSE for live reload
//! - Debounced file watching with overlapping, generation-ordered rebuilds
//! - Graceful shutdown on Ctrl+C

use std::sync::Arc;

use tokio::signal;
use tokio::sync::mpsc;

use crate::cli::DevArgs;
use crate::commands::utils;
use crate::dev::watcher::next_batch;
use crate::dev::{
    ChangeBatch, ChangeFilter, DevBuilder, DevConfig, DevEvent, DevServer, DevServerState,
    FileWatcher, RebuildOutcome,
};
use crate::error::{CliError, Result, ResultExt};
use crate::ui;

/// Execute the dev command.
///
/// # Process Flow
///
/// 1. Load and validate dev configuration
/// 2. Bind exactly `host:serverPort`
/// 3. Initial build (a failure is shown in the browser, not fatal)
/// 4. Serve, watch, and rebuild until Ctrl+C
pub async fn execute(args: DevArgs) -> Result<()> {
    ui::info("Starting development server...");

    let config = DevConfig::from_args(&args)?;
    let pipeline = Arc::new(config.base.pipeline()?);

    utils::validate_output_dir(&config.base.output_directory, &config.paths.root)?;
    utils::ensure_output_dir(&config.paths.output_dir)?;

    let state = Arc::new(DevServerState::new(config.paths.content_base.clone()));
    let builder = Arc::new(DevBuilder::new(
        Arc::clone(&pipeline),
        config.paths.clone(),
        Arc::clone(&state),
    ));

    let server = DevServer::bind(config.addr, Arc::clone(&state)).await?;

    let spinner = ui::Spinner::new("Performing initial build...");
    match builder.rebuild().await {
        RebuildOutcome::Committed { duration, .. } => {
            spinner.finish(&format!(
                "Initial build completed in {}",
                ui::format_duration(duration)
            ));
        }
        RebuildOutcome::Failed { error, .. } => {
            spinner.fail("Initial build failed");
            ui::error(&error.to_string());
        }
        RebuildOutcome::Superseded { .. } => spinner.clear(),
    }

    let mut server_handle = tokio::spawn(server.serve());
    ui::success(&format!(
        "Development server running at {}",
        config.server_url()
    ));

    let mut watch = start_watcher(&config)?;
    let filter = ChangeFilter::new(config.paths.clone(), Arc::clone(&pipeline));

    if config.open {
        open_browser(&config.server_url());
    }

    ui::info("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            batch = next_change(&mut watch, &filter, &config) => {
                match batch {
                    Some(batch) => handle_changes(batch, &builder, &state),
                    None => {
                        ui::warning("File watcher stopped; rebuilds are disabled");
                        watch = None;
                    }
                }
            }

            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                break;
            }

            result = &mut server_handle => {
                return match result {
                    Ok(Ok(())) => Err(CliError::Server("Server stopped unexpectedly".to_string())),
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(CliError::Server(format!("Server task failed: {e}"))),
                };
            }
        }
    }

    server_handle.abort();
    ui::success("Development server stopped");
    Ok(())
}

type Watch = (FileWatcher, mpsc::Receiver<std::path::PathBuf>);

/// Start the file watcher unless watching is disabled.
fn start_watcher(config: &DevConfig) -> Result<Option<Watch>> {
    if !config.watch {
        ui::info("File watching disabled");
        return Ok(None);
    }

    let (watcher, rx) = FileWatcher::new(config.watch_roots())
        .with_hint("Run with --no-watch to serve without rebuilding")?;
    for root in watcher.roots() {
        ui::info(&format!("Watching {}", root.display()));
    }
    Ok(Some((watcher, rx)))
}

/// Next debounced batch, or never when watching is off.
async fn next_change(
    watch: &mut Option<Watch>,
    filter: &ChangeFilter,
    config: &DevConfig,
) -> Option<ChangeBatch> {
    match watch {
        Some((_, rx)) => next_batch(rx, filter, config.debounce).await,
        None => std::future::pending().await,
    }
}

/// Start a rebuild for source changes, or tell clients to reload for
/// content changes.
///
/// The rebuild runs in its own task so a newer batch can supersede it.
fn handle_changes(batch: ChangeBatch, builder: &Arc<DevBuilder>, state: &DevServerState) {
    if !batch.needs_rebuild() {
        tracing::debug!(files = batch.content.len(), "Content changed");
        state.broadcast(&DevEvent::Reload);
        return;
    }

    for path in &batch.sources {
        ui::debug(&format!("Changed: {}", path.display()));
    }

    let generation = builder.next_generation();
    let builder = Arc::clone(builder);
    tokio::spawn(async move {
        report(builder.run(generation).await);
    });
}

fn report(outcome: RebuildOutcome) {
    match outcome {
        RebuildOutcome::Committed {
            generation,
            duration,
        } => ui::success(&format!(
            "Rebuilt in {} (build {generation})",
            ui::format_duration(duration)
        )),
        RebuildOutcome::Failed { error, .. } => {
            ui::error(&format!("Rebuild failed: {error}"));
        }
        RebuildOutcome::Superseded { generation } => {
            ui::debug(&format!("Build {generation} superseded by a newer change"));
        }
    }
}

/// Open the server URL in the default browser.
fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened browser at {}", url)),
        Err(e) => ui::warning(&format!("Failed to open browser: {}", e)),
    }
}
