/// Parse an artifact file name.
///
/// The name must be non-empty and must not contain a path separator: artifacts
/// are always written directly into the output directory.
///
/// # Examples
///
/// Valid: `index.bundle.js`, `app.js`, `main.css`
/// Invalid: `""`, `js/app.js`, `..\app.js`, `.`
pub fn parse_filename(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("File name cannot be empty".to_string());
    }

    if s.contains('/') || s.contains('\\') {
        return Err(format!(
            "File name must not contain a path separator: '{}'",
            s
        ));
    }

    if s == "." || s == ".." {
        return Err(format!("File name is not a file: '{}'", s));
    }

    if s.contains('\0') {
        return Err("File name contains a null byte".to_string());
    }

    Ok(s.to_string())
}

/// Parse a TCP port for the dev server. Port 0 is rejected: the server binds
/// exactly the requested port and never picks one on its own.
pub fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .parse()
        .map_err(|_| format!("Port must be a number between 1 and 65535: '{}'", s))?;
    if port == 0 {
        return Err("Port must be between 1 and 65535".to_string());
    }
    Ok(port)
}
