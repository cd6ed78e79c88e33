//! Integration tests for the development server.
//!
//! Tests verify port binding, artifact and content serving, the error
//! overlay, and SSE event delivery over real sockets.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use kiln_cli::config::KilnConfig;
use kiln_cli::dev::{DevBuilder, DevServer, DevServerState, RebuildOutcome};
use kiln_cli::CliError;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};

struct Harness {
    _temp: TempDir,
    root: std::path::PathBuf,
    addr: SocketAddr,
    builder: Arc<DevBuilder>,
    state: Arc<DevServerState>,
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Project with one script and one stylesheet, served on an ephemeral port.
async fn start() -> Harness {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    write(&root, "src/app.js", "var message = 'from kiln';\n");
    write(&root, "src/main.scss", "$gap: 4px;\n.card { margin: $gap; }\n");

    let config = KilnConfig::default();
    let paths = config.resolve(&root);
    let pipeline = Arc::new(config.pipeline().unwrap());
    let state = Arc::new(DevServerState::new(paths.content_base.clone()));
    let builder = Arc::new(DevBuilder::new(pipeline, paths, Arc::clone(&state)));

    let server = DevServer::bind("127.0.0.1:0".parse().unwrap(), Arc::clone(&state))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve());

    Harness {
        _temp: temp,
        root,
        addr,
        builder,
        state,
    }
}

/// Issue a GET and return (status line, full response text).
async fn get(addr: SocketAddr, path: &str) -> (String, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();

    let text = String::from_utf8_lossy(&response).into_owned();
    let status = text.lines().next().unwrap_or_default().to_string();
    (status, text)
}

#[tokio::test]
async fn test_bind_fails_when_port_in_use() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = occupied.local_addr().unwrap();

    let state = Arc::new(DevServerState::new("public".into()));
    let result = DevServer::bind(addr, state).await;

    match result {
        Err(CliError::Server(message)) => {
            assert!(message.contains(&addr.port().to_string()));
            assert!(message.contains("Hint"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("bind should fail on an occupied port"),
    }
}

#[tokio::test]
async fn test_serves_committed_artifacts() {
    let harness = start().await;
    let outcome = harness.builder.rebuild().await;
    assert!(matches!(outcome, RebuildOutcome::Committed { .. }));

    let (status, body) = get(harness.addr, "/index.bundle.js").await;
    assert!(status.contains("200"), "{status}");
    assert!(body.contains("from kiln"));
    assert!(body.to_ascii_lowercase().contains("content-type: application/javascript"));

    let (status, body) = get(harness.addr, "/main.css").await;
    assert!(status.contains("200"), "{status}");
    assert!(body.contains(".card"));
    assert!(!body.contains("$gap"));

    // Dev builds are written to disk as well
    assert!(harness.root.join("dist/index.bundle.js").exists());
}

#[tokio::test]
async fn test_generated_index_links_artifacts() {
    let harness = start().await;
    harness.builder.rebuild().await;

    let (status, body) = get(harness.addr, "/").await;
    assert!(status.contains("200"), "{status}");
    assert!(body.contains(r#"<link rel="stylesheet" href="/main.css">"#));
    assert!(body.contains(r#"<script src="/index.bundle.js"></script>"#));
    assert!(body.contains("/__kiln_reload__.js"));
}

#[tokio::test]
async fn test_content_base_html_gets_reload_script() {
    let harness = start().await;
    write(
        &harness.root,
        "public/about.html",
        "<html><body><p>About</p></body></html>",
    );
    harness.builder.rebuild().await;

    let (status, body) = get(harness.addr, "/about.html").await;
    assert!(status.contains("200"), "{status}");
    assert!(body.contains("<p>About</p>"));
    assert!(body.contains(r#"<script src="/__kiln_reload__.js"></script>"#));
}

#[tokio::test]
async fn test_reload_script_and_missing_files() {
    let harness = start().await;

    let (status, body) = get(harness.addr, "/__kiln_reload__.js").await;
    assert!(status.contains("200"), "{status}");
    assert!(body.contains("EventSource"));

    let (status, _) = get(harness.addr, "/nope.js").await;
    assert!(status.contains("404"), "{status}");

    let (status, _) = get(harness.addr, "/favicon.ico").await;
    assert!(status.contains("204"), "{status}");
}

#[tokio::test]
async fn test_failed_build_shows_overlay_and_keeps_artifacts() {
    let harness = start().await;
    harness.builder.rebuild().await;

    write(&harness.root, "src/app.js", "var = ;\n");
    let outcome = harness.builder.rebuild().await;
    assert!(matches!(outcome, RebuildOutcome::Failed { .. }));
    assert!(harness.state.status().error().is_some());

    let (status, body) = get(harness.addr, "/").await;
    assert!(status.contains("200"), "{status}");
    assert!(body.contains("Build Error"));

    // The last good bundle is still served
    let (_, body) = get(harness.addr, "/index.bundle.js").await;
    assert!(body.contains("from kiln"));
}

#[tokio::test]
async fn test_sse_delivers_build_events() {
    let harness = start().await;

    let mut stream = TcpStream::connect(harness.addr).await.unwrap();
    stream
        .write_all(b"GET /__kiln_sse__ HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n")
        .await
        .unwrap();

    // Wait until the server has registered the client
    timeout(Duration::from_secs(5), async {
        while harness.state.client_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    harness.builder.rebuild().await;

    let mut received = String::new();
    let mut buf = [0u8; 4096];
    timeout(Duration::from_secs(5), async {
        while !received.contains("BuildCompleted") {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "SSE stream closed early");
            received.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
    })
    .await
    .unwrap();

    assert!(received.to_ascii_lowercase().contains("text/event-stream"));
    assert!(received.contains("ClientConnected"));
    assert!(received.contains("BuildStarted"));
    assert!(received.contains("BuildCompleted"));
}
