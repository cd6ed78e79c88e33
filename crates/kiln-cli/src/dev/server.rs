//! Development server with live reload via Server-Sent Events.
//!
//! Serves the committed artifacts from memory, other paths from the content
//! base, and pushes build events to browsers.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::get,
};
use tokio::net::TcpListener;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tower_http::cors::{Any, CorsLayer};

use crate::dev::{DevEvent, SharedState, error_overlay};
use crate::error::{CliError, Result};

pub const SSE_PATH: &str = "/__kiln_sse__";
pub const RELOAD_SCRIPT_PATH: &str = "/__kiln_reload__.js";

const RELOAD_SCRIPT: &str = include_str!("../../assets/dev/reload-client.js");

/// Development server bound to its socket.
pub struct DevServer {
    listener: TcpListener,
    state: SharedState,
}

impl DevServer {
    /// Bind exactly `addr`.
    ///
    /// # Errors
    ///
    /// `CliError::Server` if the address is in use or can't be bound. There
    /// is no fallback to another port.
    pub async fn bind(addr: SocketAddr, state: SharedState) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            CliError::Server(format!(
                "Failed to bind to {addr}: {e}\n\nHint: Another process may be using port {}; set --port or serverPort",
                addr.port()
            ))
        })?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until the task is dropped.
    pub async fn serve(self) -> Result<()> {
        axum::serve(self.listener, router(self.state))
            .await
            .map_err(|e| CliError::Server(format!("Server error: {e}")))
    }
}

/// Build the axum router with all routes.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(SSE_PATH, get(handle_sse))
        .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
        .fallback(handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Handle SSE connections for reload events.
async fn handle_sse(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    tracing::debug!(client = id, "SSE client connected");
    state.broadcast(&DevEvent::ClientConnected { id });

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Serve the reload client script.
async fn handle_reload_script() -> Response {
    respond("application/javascript; charset=utf-8", RELOAD_SCRIPT)
}

/// Everything else: overlay, artifacts, content base, generated index.
async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    let path = uri.path();
    let is_page = path == "/" || path.ends_with(".html");

    if is_page {
        if let Some(error) = state.status().error() {
            return respond(
                "text/html; charset=utf-8",
                error_overlay::generate_error_overlay(error),
            );
        }
    }

    let name = path.trim_start_matches('/');
    let cache = state.cache();
    if let Some(artifact) = cache.get(name) {
        return respond(artifact.content_type, artifact.content.to_vec());
    }

    if let Some(file) = content_file(state.content_base(), name) {
        match tokio::fs::read(&file).await {
            Ok(content) => {
                let content_type = determine_content_type(&file);
                return respond(content_type, inject_reload_script(content, content_type));
            }
            Err(e) => {
                tracing::warn!(path = %file.display(), "Failed to read content file: {e}");
            }
        }
    }

    match path {
        "/" => respond(
            "text/html; charset=utf-8",
            error_overlay::generate_index_html(cache.stylesheet_names(), cache.bundle_name()),
        ),
        "/favicon.ico" => StatusCode::NO_CONTENT.into_response(),
        _ => (StatusCode::NOT_FOUND, format!("File not found: {path}")).into_response(),
    }
}

fn respond(content_type: &'static str, body: impl Into<Body>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body.into(),
    )
        .into_response()
}

/// Resolve a request path inside the content base.
///
/// Rejects anything that would leave the directory. Directories resolve to
/// their `index.html`.
fn content_file(base: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    if !relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return None;
    }

    let mut file = base.join(relative);
    if file.is_dir() {
        file.push("index.html");
    }
    file.is_file().then_some(file)
}

/// Inject the reload client before the closing `</body>` tag of HTML content.
fn inject_reload_script(content: Vec<u8>, content_type: &str) -> Vec<u8> {
    if !content_type.starts_with("text/html") {
        return content;
    }

    let html = String::from_utf8_lossy(&content);
    let script_tag = format!(r#"<script src="{RELOAD_SCRIPT_PATH}"></script>"#);

    let mut result = String::with_capacity(html.len() + script_tag.len() + 4);
    match html.rfind("</body>") {
        Some(pos) => {
            result.push_str(&html[..pos]);
            result.push_str(&script_tag);
            result.push('\n');
            result.push_str(&html[pos..]);
        }
        None => {
            result.push_str(&html);
            result.push('\n');
            result.push_str(&script_tag);
        }
    }
    result.into_bytes()
}

/// Determine content type from file extension.
fn determine_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    match extension {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_inject_reload_script_with_body() {
        let html = b"<html><body><h1>Test</h1></body></html>".to_vec();
        let result = String::from_utf8(inject_reload_script(html, "text/html")).unwrap();

        let script_pos = result
            .find(r#"<script src="/__kiln_reload__.js"></script>"#)
            .unwrap();
        let body_pos = result.find("</body>").unwrap();
        assert!(script_pos < body_pos);
    }

    #[test]
    fn test_inject_reload_script_without_body() {
        let html = b"<h1>Test</h1>".to_vec();
        let result = String::from_utf8(inject_reload_script(html, "text/html")).unwrap();
        assert!(result.ends_with(r#"<script src="/__kiln_reload__.js"></script>"#));
    }

    #[test]
    fn test_inject_reload_script_non_html() {
        let js = b"console.log('test');".to_vec();
        let result = inject_reload_script(js.clone(), "application/javascript");
        assert_eq!(result, js);
    }

    #[test]
    fn test_content_file_resolution() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("index.html"), "<html></html>").unwrap();
        fs::write(temp.path().join("docs/index.html"), "<html></html>").unwrap();
        fs::write(temp.path().join("logo.svg"), "<svg/>").unwrap();

        assert_eq!(
            content_file(temp.path(), "logo.svg"),
            Some(temp.path().join("logo.svg"))
        );
        assert_eq!(
            content_file(temp.path(), "docs"),
            Some(temp.path().join("docs/index.html"))
        );
        assert_eq!(
            content_file(temp.path(), ""),
            Some(temp.path().join("index.html"))
        );
        assert_eq!(content_file(temp.path(), "missing.png"), None);
        assert_eq!(content_file(temp.path(), "../etc/passwd"), None);
    }

    #[test]
    fn test_determine_content_type() {
        assert_eq!(determine_content_type(Path::new("a.css")), "text/css; charset=utf-8");
        assert_eq!(determine_content_type(Path::new("a.png")), "image/png");
        assert_eq!(
            determine_content_type(Path::new("a.unknown")),
            "application/octet-stream"
        );
    }
}
