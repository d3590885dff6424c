use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn page_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test_assets/basic_page.json")
}

/// Run sdump with an isolated config home so a user config never leaks in.
fn run_sdump(args: &[&str]) -> (Output, TempDir) {
    let home = TempDir::new().expect("tempdir");
    let output = Command::new(env!("CARGO_BIN_EXE_sdump"))
        .args(args)
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("SDUMP_MOCK_PAGE")
        .env_remove("SDUMP_MOCK_CAPTURE")
        .output()
        .expect("run sdump");
    (output, home)
}

fn parse_json(stdout: &[u8]) -> serde_json::Value {
    serde_json::from_slice(stdout).expect("stdout is JSON")
}

#[test]
fn extract_exits_zero_when_root_found() {
    let fixture = page_fixture();
    let (output, _home) = run_sdump(&[
        "extract",
        "--input",
        fixture.to_str().unwrap(),
        "--selector",
        "#card",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let json = parse_json(&output.stdout);
    assert_eq!(json["target"]["source"], "selector");
}

#[test]
fn extract_exits_one_with_bare_error_when_selector_misses() {
    let fixture = page_fixture();
    let (output, _home) = run_sdump(&[
        "extract",
        "--input",
        fixture.to_str().unwrap(),
        "--selector",
        "#nope",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r#"{"error":"No root element found"}"#
    );
}

#[test]
fn extract_exits_two_for_invalid_selector() {
    let fixture = page_fixture();
    let (output, _home) = run_sdump(&[
        "extract",
        "--input",
        fixture.to_str().unwrap(),
        "--selector",
        "div[",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let json = parse_json(&output.stdout);
    assert_eq!(json["category"], "extraction");
    assert!(json["error"].as_str().unwrap_or_default().contains("div["));
}

#[test]
fn extract_exits_two_for_missing_input() {
    let (output, _home) = run_sdump(&[
        "extract",
        "--input",
        "/definitely/not/here/page.json",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let json = parse_json(&output.stdout);
    assert_eq!(json["category"], "config");
    assert!(json["error"]
        .as_str()
        .unwrap_or_default()
        .contains("Local file not found"));
}

#[test]
fn extract_exits_two_for_invalid_config() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = dir.path().join("sdump.toml");
    std::fs::write(&cfg, "[viewport]\nwidth = \"wide\"\n").expect("write config");
    let fixture = page_fixture();
    let (output, _home) = run_sdump(&[
        "extract",
        "--input",
        fixture.to_str().unwrap(),
        "--config",
        cfg.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(2));
    let json = parse_json(&output.stdout);
    assert_eq!(json["category"], "config");
}

#[test]
fn extract_accepts_valid_config() {
    let dir = TempDir::new().expect("tempdir");
    let cfg = dir.path().join("sdump.toml");
    std::fs::write(&cfg, "[extraction]\nmode = \"rules\"\nchildren = false\n")
        .expect("write config");
    let fixture = page_fixture();
    let (output, _home) = run_sdump(&[
        "extract",
        "--input",
        fixture.to_str().unwrap(),
        "--selector",
        "#card",
        "--config",
        cfg.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0));
    let json = parse_json(&output.stdout);
    assert_eq!(json["mode"], "rules");
    assert_eq!(json["includeChildren"], false);
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(1));
}

#[test]
fn extract_pretty_to_file_keeps_json_shape() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("out.json");
    let fixture = page_fixture();
    let (output, _home) = run_sdump(&[
        "extract",
        "--input",
        fixture.to_str().unwrap(),
        "--selector",
        "#card",
        "--format",
        "pretty",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0));
    let written = std::fs::read(&out).expect("output written");
    let json = parse_json(&written);
    assert_eq!(json["stats"]["nodeCount"], 2);
}

#[test]
fn capture_element_without_selector_exits_two() {
    let (output, _home) = run_sdump(&[
        "capture",
        "--url",
        "https://example.com",
        "--target",
        "element",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let json = parse_json(&output.stdout);
    assert_eq!(json["category"], "capture");
    assert!(json["error"]
        .as_str()
        .unwrap_or_default()
        .contains("No element selected"));
}

#[test]
fn capture_rejects_long_settle_delay() {
    let (output, _home) = run_sdump(&[
        "capture",
        "--url",
        "https://example.com",
        "--target",
        "full-page",
        "--settle-delay",
        "20000",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let json = parse_json(&output.stdout);
    assert_eq!(json["category"], "config");
    assert!(json["error"].as_str().unwrap_or_default().contains("settle"));
}

#[test]
fn capture_rejects_unsupported_scheme() {
    let (output, _home) = run_sdump(&["capture", "--url", "ftp://example.com/file"]);
    assert_eq!(output.status.code(), Some(2));
}
