use crate::browser::SavedScreenshot;
use crate::cascade::ExtractionResponse;
use crate::error::{ErrorCategory, ErrorPayload};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the CLI prints: an extraction response, a capture report or
/// an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SdumpOutput {
    Error(ErrorOutput),
    Capture(CaptureOutput),
    Extract(ExtractionResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub error: String,
    pub category: ErrorCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl From<ErrorPayload> for ErrorOutput {
    fn from(payload: ErrorPayload) -> Self {
        Self {
            error: payload.message,
            category: payload.category,
            remediation: payload.remediation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutput {
    pub url: String,
    pub screenshot: SavedScreenshot,
}

/// Where `--html-output` wrote the styled markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlExport {
    pub path: PathBuf,
    pub bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureKind;

    #[test]
    fn extraction_failure_serializes_bare() {
        let out = SdumpOutput::Extract(ExtractionResponse::Failure {
            error: "No root element found".into(),
        });
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"error":"No root element found"}"#
        );
    }

    #[test]
    fn error_output_carries_category_and_hint() {
        let payload = ErrorPayload::new(ErrorCategory::Browser, "boom".into(), "retry");
        let out = SdumpOutput::Error(payload.into());
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "boom", "category": "browser", "remediation": "retry"})
        );
    }

    #[test]
    fn capture_output_serializes() {
        let out = SdumpOutput::Capture(CaptureOutput {
            url: "https://example.com/".into(),
            screenshot: SavedScreenshot {
                kind: CaptureKind::FullPage,
                path: PathBuf::from("shots/fullpage_example.com_20240101-000000.png"),
                width: 1440,
                height: 4000,
                bounds: None,
            },
        });
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["screenshot"]["kind"], "full-page");
        assert_eq!(json["screenshot"]["height"], 4000);
        assert!(json["screenshot"].get("bounds").is_none());
    }
}
