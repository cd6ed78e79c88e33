//! Error overlay and generated pages for development mode.
//!
//! The overlay is served in place of HTML pages while the latest build is
//! failing. The reload client replaces it once a build commits.

use crate::dev::server::RELOAD_SCRIPT_PATH;

/// Generate an HTML error overlay page.
///
/// # Security
///
/// The error text is HTML-escaped; it routinely contains source snippets
/// and file paths.
pub fn generate_error_overlay(error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Build Error</title>
  <style>
    body {{ margin: 0; background: #1e1e1e; color: #e6e6e6; font-family: ui-monospace, Menlo, monospace; }}
    main {{ max-width: 960px; margin: 4rem auto; padding: 0 1.5rem; }}
    h1 {{ color: #ff6b6b; font-size: 1.4rem; }}
    pre {{ background: #2a2a2a; padding: 1rem; border-left: 4px solid #ff6b6b; white-space: pre-wrap; overflow-x: auto; }}
    p {{ color: #9a9a9a; }}
  </style>
</head>
<body>
  <main>
    <h1>Build Error</h1>
    <pre>{error}</pre>
    <p>Fix the error and save; the page reloads when the next build succeeds.</p>
  </main>
  <script src="{script}"></script>
</body>
</html>
"#,
        error = html_escape(error),
        script = RELOAD_SCRIPT_PATH,
    )
}

/// Generate the `index.html` served at `/` when the content base has none.
///
/// Links every stylesheet and the script bundle of the last committed build.
pub fn generate_index_html(stylesheets: &[String], bundle: Option<&str>) -> String {
    let links: String = stylesheets
        .iter()
        .map(|name| format!("  <link rel=\"stylesheet\" href=\"/{}\">\n", html_escape(name)))
        .collect();
    let script = bundle
        .map(|name| format!("  <script src=\"/{}\"></script>\n", html_escape(name)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  <title>kiln dev</title>\n{links}</head>\n<body>\n  <div id=\"root\"></div>\n{script}  <script src=\"{RELOAD_SCRIPT_PATH}\"></script>\n</body>\n</html>\n"
    )
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
