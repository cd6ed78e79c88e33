//! Integration tests for the build command.
//!
//! These tests verify end-to-end build functionality with real files and directories.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use kiln_cli::cli::BuildArgs;
use kiln_cli::commands::build_execute;
use kiln_cli::{BuildError, CliError};
use predicates::prelude::*;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn args(root: &Path) -> BuildArgs {
    BuildArgs {
        cwd: Some(root.to_path_buf()),
        ..Default::default()
    }
}

fn sample_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "src/app.js",
        "const greet = (name) => `hello ${name}`;\nconsole.log(greet('kiln'));\n",
    );
    write(
        temp.path(),
        "src/styles/theme.scss",
        "$accent: rebeccapurple;\n.button { color: $accent; }\n",
    );
    temp
}

#[tokio::test]
async fn test_build_writes_bundle_and_stylesheet() {
    let temp = sample_project();

    build_execute(args(temp.path())).await.unwrap();

    let bundle = fs::read_to_string(temp.path().join("dist/index.bundle.js")).unwrap();
    assert!(bundle.contains("/* app.js */"));
    assert!(bundle.contains("greet"));

    let css = fs::read_to_string(temp.path().join("dist/main.css")).unwrap();
    assert!(css.contains("/* styles/theme.scss */"));
    assert!(css.contains(".button"));
    assert!(!css.contains("$accent"));
}

#[tokio::test]
async fn test_build_skips_unmatched_files() {
    let temp = sample_project();
    write(temp.path(), "src/notes.md", "# not an asset\n");

    build_execute(args(temp.path())).await.unwrap();

    let bundle = fs::read_to_string(temp.path().join("dist/index.bundle.js")).unwrap();
    assert!(!bundle.contains("notes.md"));
    assert!(!temp.path().join("dist/notes.md").exists());
}

#[tokio::test]
async fn test_build_honors_config_file_and_flags() {
    let temp = sample_project();
    write(
        temp.path(),
        "kiln.config.json",
        r#"{ "outputDirectory": "public/build", "outputFilename": "app.js" }"#,
    );

    let mut build_args = args(temp.path());
    build_args.filename = Some("site.js".to_string());
    build_execute(build_args).await.unwrap();

    // The flag wins over the file, the file wins over the defaults
    assert!(temp.path().join("public/build/site.js").exists());
    assert!(temp.path().join("public/build/main.css").exists());
    assert!(!temp.path().join("public/build/app.js").exists());
    assert!(!temp.path().join("dist").exists());
}

#[tokio::test]
async fn test_build_with_declared_entries() {
    let temp = sample_project();
    write(temp.path(), "src/unused.js", "console.log('never bundled');\n");
    write(
        temp.path(),
        "kiln.config.json",
        r#"{ "entries": ["src/app.js", "src/styles/theme.scss"] }"#,
    );

    build_execute(args(temp.path())).await.unwrap();

    let bundle = fs::read_to_string(temp.path().join("dist/index.bundle.js")).unwrap();
    assert!(bundle.contains("/* src/app.js */"));
    assert!(!bundle.contains("never bundled"));
}

#[tokio::test]
async fn test_build_missing_entry_is_error() {
    let temp = sample_project();
    write(
        temp.path(),
        "kiln.config.json",
        r#"{ "entries": ["src/missing.js"] }"#,
    );

    let err = build_execute(args(temp.path())).await.unwrap_err();
    assert!(matches!(err, CliError::Build(BuildError::EntryNotFound(_))));
}

#[tokio::test]
async fn test_build_malformed_script_writes_nothing() {
    let temp = sample_project();
    write(temp.path(), "src/broken.js", "function ( {\n");

    let result = build_execute(args(temp.path())).await;

    assert!(result.is_err());
    assert!(!temp.path().join("dist/index.bundle.js").exists());
    assert!(!temp.path().join("dist/main.css").exists());
}

#[tokio::test]
async fn test_build_clean_removes_stale_files() {
    let temp = sample_project();
    write(temp.path(), "dist/stale.css", "body {}");

    let mut build_args = args(temp.path());
    build_args.clean = true;
    build_execute(build_args).await.unwrap();

    assert!(!temp.path().join("dist/stale.css").exists());
    assert!(temp.path().join("dist/index.bundle.js").exists());
}

#[tokio::test]
async fn test_build_clean_keeps_previous_output_on_failure() {
    let temp = sample_project();
    build_execute(args(temp.path())).await.unwrap();
    let previous = fs::read_to_string(temp.path().join("dist/index.bundle.js")).unwrap();

    write(temp.path(), "src/broken.js", "function ( {\n");
    let mut build_args = args(temp.path());
    build_args.clean = true;
    let result = build_execute(build_args).await;

    assert!(result.is_err());
    assert_eq!(
        fs::read_to_string(temp.path().join("dist/index.bundle.js")).unwrap(),
        previous
    );
    assert!(temp.path().join("dist/main.css").exists());
}

#[tokio::test]
async fn test_build_split_styles_collision_is_error() {
    let temp = sample_project();
    build_execute(args(temp.path())).await.unwrap();
    let previous = fs::read_to_string(temp.path().join("dist/index.bundle.js")).unwrap();

    write(temp.path(), "src/styles/theme.sass", ".link\n  color: blue\n");
    write(temp.path(), "src/app.js", "console.log('changed');\n");
    write(temp.path(), "kiln.config.json", r#"{ "splitStyles": true }"#);

    let err = build_execute(args(temp.path())).await.unwrap_err();

    assert!(matches!(
        err,
        CliError::Build(BuildError::ArtifactConflict { .. })
    ));
    assert_eq!(
        fs::read_to_string(temp.path().join("dist/index.bundle.js")).unwrap(),
        previous
    );
    assert!(!temp.path().join("dist/styles/theme.css").exists());
}

#[tokio::test]
async fn test_build_jsx_in_js_source() {
    let temp = sample_project();
    write(
        temp.path(),
        "src/components/Button.js",
        "const Button = () => <button className=\"primary\">Go</button>;\n",
    );

    build_execute(args(temp.path())).await.unwrap();

    let bundle = fs::read_to_string(temp.path().join("dist/index.bundle.js")).unwrap();
    assert!(bundle.contains("/* components/Button.js */"));
    assert!(bundle.contains("React.createElement"));
}

#[tokio::test]
async fn test_build_rejects_output_outside_project() {
    let temp = sample_project();

    let mut build_args = args(temp.path());
    build_args.out_dir = Some("/etc".into());
    let err = build_execute(build_args).await.unwrap_err();

    assert!(matches!(err, CliError::Build(BuildError::OutputNotWritable(_))));
}

#[tokio::test]
async fn test_build_missing_source_dir() {
    let temp = TempDir::new().unwrap();

    let err = build_execute(args(temp.path())).await.unwrap_err();
    assert!(matches!(err, CliError::Build(BuildError::SourceDirNotFound(_))));
}

#[test]
fn test_binary_exits_nonzero_on_build_failure() {
    let temp = sample_project();
    write(temp.path(), "src/broken.js", "let = ;\n");

    Command::cargo_bin("kiln")
        .unwrap()
        .args(["--quiet", "build", "--cwd"])
        .arg(temp.path())
        .assert()
        .failure();
}

#[test]
fn test_binary_build_succeeds() {
    let temp = sample_project();

    Command::cargo_bin("kiln")
        .unwrap()
        .args(["--quiet", "build", "--cwd"])
        .arg(temp.path())
        .assert()
        .success();

    assert!(temp.path().join("dist/index.bundle.js").exists());
}

#[test]
fn test_binary_check_prints_schema() {
    Command::cargo_bin("kiln")
        .unwrap()
        .args(["check", "--schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("outputFilename"));
}
