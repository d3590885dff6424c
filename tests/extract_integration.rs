use sdump_lib::cascade::TargetSource;
use sdump_lib::types::PseudoElement;
use sdump_lib::{extract, ExtractError, ExtractionMode, ExtractionRequest, PageModel};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn load_page() -> PageModel {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_assets/basic_page.json");
    let raw = std::fs::read_to_string(path).expect("read fixture");
    PageModel::from_json(&raw).expect("parse fixture")
}

fn sdump(args: &[&str]) -> std::process::Output {
    let home = TempDir::new().expect("tempdir");
    Command::new(env!("CARGO_BIN_EXE_sdump"))
        .args(args)
        .env("XDG_CONFIG_HOME", home.path())
        .output()
        .expect("run sdump")
}

#[test]
fn rules_mode_reports_winning_rule_per_property() {
    let page = load_page();
    let request = ExtractionRequest {
        selector: Some("#card".into()),
        mode: ExtractionMode::Rules,
        children: false,
        ..ExtractionRequest::default()
    };
    let result = extract(&page, &request, page.inspected_element()).expect("extract");

    assert_eq!(result.target.source, TargetSource::Selector);
    assert_eq!(result.stats.node_count, 1);
    let card = &result.nodes[0];
    assert_eq!(card.path, "#card");
    assert_eq!(card.text_preview, "Hello New");
    assert_eq!(card.styles.get("color").map(String::as_str), Some("rgb(0, 0, 255)"));
    assert_eq!(card.styles.get("padding-top").map(String::as_str), Some("8px"));
    assert!(!card.styles.contains_key("display"), "UA default leaked: {:?}", card.styles);

    let sources = card.sources.as_ref().expect("rules mode has sources");
    let color = &sources["color"];
    assert_eq!(color.selector.as_deref(), Some("#card"));
    assert_eq!(color.specificity, Some(1000));
    assert!(!color.requires_important);
    assert_eq!(sources["padding-top"].selector.as_deref(), Some(".card"));
}

#[test]
fn rules_mode_keeps_pseudo_content() {
    let page = load_page();
    let request = ExtractionRequest {
        selector: Some("#card".into()),
        mode: ExtractionMode::Rules,
        children: false,
        ..ExtractionRequest::default()
    };
    let result = extract(&page, &request, None).expect("extract");
    let pseudo = &result.nodes[0].pseudo;
    let before = pseudo.get(&PseudoElement::Before).expect("::before present");
    assert_eq!(before.get("content").map(String::as_str), Some("\"*\""));
    let after = pseudo.get(&PseudoElement::After).expect("::after present");
    assert!(after.is_empty());
}

#[test]
fn inline_declarations_win_and_need_important() {
    let page = load_page();
    let request = ExtractionRequest {
        selector: Some(".badge".into()),
        mode: ExtractionMode::Rules,
        ..ExtractionRequest::default()
    };
    let result = extract(&page, &request, None).expect("extract");
    let badge = &result.nodes[0];
    assert_eq!(badge.path, "body > main > div.card > span.badge");
    let sources = badge.sources.as_ref().expect("sources");
    let margin = &sources["margin-left"];
    assert!(margin.selector.is_none());
    assert!(margin.requires_important);
    assert_eq!(badge.styles.get("font-weight").map(String::as_str), Some("700"));
    assert!(sources["font-weight"].media.is_some());
}

#[test]
fn falls_back_from_inspected_to_body() {
    let page = load_page();

    let inspected = extract(&page, &ExtractionRequest::default(), page.inspected_element())
        .expect("extract inspected");
    assert_eq!(inspected.target.source, TargetSource::Inspected);
    assert_eq!(inspected.nodes[0].path, "#app");

    let request = ExtractionRequest {
        use_inspected: false,
        ..ExtractionRequest::default()
    };
    let body = extract(&page, &request, page.inspected_element()).expect("extract body");
    assert_eq!(body.target.source, TargetSource::Body);
    assert_eq!(body.nodes[0].tag, "body");
    assert_eq!(body.stats.node_count, 4);
}

#[test]
fn missing_selector_match_never_falls_back() {
    let page = load_page();
    let request = ExtractionRequest {
        selector: Some("#nope".into()),
        ..ExtractionRequest::default()
    };
    let err = extract(&page, &request, page.inspected_element()).unwrap_err();
    assert_eq!(err, ExtractError::NoRootElement);
}

#[test]
fn all_mode_skips_empty_computed_values() {
    let page = load_page();
    let request = ExtractionRequest {
        selector: Some("#card".into()),
        children: false,
        pseudo: false,
        ..ExtractionRequest::default()
    };
    let result = extract(&page, &request, None).expect("extract");
    let card = &result.nodes[0];
    assert!(card.sources.is_none());
    assert!(card.pseudo.is_empty());
    assert_eq!(card.styles.get("display").map(String::as_str), Some("block"));
    assert!(!card.styles.contains_key("background-image"));
}

#[test]
fn cli_writes_styled_html_to_file() {
    let dir = TempDir::new().expect("tempdir");
    let html_path = dir.path().join("export/card.html");
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_assets/basic_page.json");
    let output = sdump(&[
        "extract",
        "--input",
        fixture.to_str().unwrap(),
        "--selector",
        "#card",
        "--mode",
        "rules",
        "--html-output",
        html_path.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0));

    let html = std::fs::read_to_string(&html_path).expect("html written");
    assert!(html.starts_with("<div"));
    assert!(html.contains("style=\""));
    assert!(html.contains("color: rgb(0, 0, 255)"));
    assert!(html.contains("Hello"));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert!(json.get("html").is_none());
}

#[test]
fn cli_inspect_overrides_recorded_element() {
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_assets/basic_page.json");
    let output = sdump(&[
        "extract",
        "--input",
        fixture.to_str().unwrap(),
        "--inspect",
        ".badge",
        "--no-children",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["target"]["source"], "$0");
    assert_eq!(json["nodes"][0]["path"], "body > main > div.card > span.badge");
}

#[test]
fn cli_renders_url_input_from_mock_page_model() {
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_assets/basic_page.json");
    let home = TempDir::new().expect("tempdir");
    let output = Command::new(env!("CARGO_BIN_EXE_sdump"))
        .args(["extract", "--input", "https://example.com/", "--selector", "main"])
        .env("XDG_CONFIG_HOME", home.path())
        .env("SDUMP_MOCK_PAGE", &fixture)
        .output()
        .expect("run sdump");
    assert_eq!(output.status.code(), Some(0));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["nodes"][0]["path"], "#app");
}
