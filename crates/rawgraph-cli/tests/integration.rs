//! Integration tests for rawgraph-cli.
//!
//! Runs the `rawgraph` binary against bundled and on-disk pipelines.

use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `rawgraph` binary built by cargo.
fn rawgraph_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rawgraph"))
}

// ---------------------------------------------------------------------------
// `rawgraph modules`
// ---------------------------------------------------------------------------

#[test]
fn cli_modules_lists_all_kinds() {
    let output = rawgraph_bin()
        .arg("modules")
        .output()
        .expect("failed to run rawgraph modules");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Available Modules"));
    for kind in ["i-raw", "dev", "demosaic", "crop", "filmcurv", "display"] {
        assert!(stdout.contains(kind), "listing should contain '{kind}'");
    }
}

#[test]
fn cli_modules_detail_shows_parameters() {
    let output = rawgraph_bin()
        .args(["modules", "crop"])
        .output()
        .expect("failed to run rawgraph modules crop");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("perspect"));
    assert!(stdout.contains("Committed block: 13 floats"));
}

#[test]
fn cli_modules_unknown_kind_fails() {
    let output = rawgraph_bin()
        .args(["modules", "vignette"])
        .output()
        .expect("failed to run rawgraph modules vignette");
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// `rawgraph pipelines` and `rawgraph compile`
// ---------------------------------------------------------------------------

#[test]
fn cli_pipelines_export_then_compile() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.toml");

    let output = rawgraph_bin()
        .args(["pipelines", "raw-default", "--write"])
        .arg(&path)
        .output()
        .expect("failed to run rawgraph pipelines");
    assert!(output.status.success());
    assert!(path.exists());

    let output = rawgraph_bin()
        .arg("compile")
        .arg(&path)
        .output()
        .expect("failed to run rawgraph compile");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("12 nodes"), "{stdout}");
    assert!(stdout.contains("dev:main/doub"), "{stdout}");
    assert!(stdout.contains("demosaic:main/main"), "{stdout}");
}

#[test]
fn cli_compile_json() {
    let output = rawgraph_bin()
        .args(["compile", "--factory", "rgb-default", "--format", "json"])
        .output()
        .expect("failed to run rawgraph compile");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim_start().starts_with('{'), "{stdout}");
    assert!(stdout.contains("\"kernel\": \"sink\""), "{stdout}");
}

#[test]
fn cli_compile_reports_capacity() {
    let output = rawgraph_bin()
        .args(["compile", "--factory", "raw-default", "--max-nodes", "4"])
        .output()
        .expect("failed to run rawgraph compile");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("compiling pipeline"), "{stderr}");
}

#[test]
fn cli_compile_missing_file() {
    let output = rawgraph_bin()
        .args(["compile", "/nonexistent/pipeline.toml"])
        .output()
        .expect("failed to run rawgraph compile");
    assert!(!output.status.success());
}
