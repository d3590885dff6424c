use crate::capture::CaptureError;
use crate::cascade::ExtractError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum SdumpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Screenshot failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl SdumpError {
    pub fn config(message: impl Into<String>) -> Self {
        SdumpError::Config(message.into())
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            SdumpError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check file paths/permissions.",
            ),
            SdumpError::InvalidUrl(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Verify URL/format (e.g., https://example.com) or pass a captured page.json.",
            ),
            SdumpError::Image(e) => ErrorPayload::new(
                ErrorCategory::Image,
                e.to_string(),
                "The browser returned an unreadable screenshot; rerun with --verbose.",
            ),
            SdumpError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check that the page model is JSON written by `sdump extract` or the capture helper.",
            ),
            SdumpError::Extraction(e) => ErrorPayload::new(
                ErrorCategory::Extraction,
                e.to_string(),
                "Check --selector/--inspect; selectors must be valid CSS and match an element.",
            ),
            SdumpError::Capture(e) => {
                let remediation = match e {
                    CaptureError::ElementNotFound => "Check that --selector matches an element once the page has loaded.",
                    CaptureError::NoElementSelected => "Pass --selector together with --target element.",
                    CaptureError::ZeroDimensions | CaptureError::OutsideViewport => {
                        "The element is not visible in the viewport; try a larger --viewport or a different element."
                    }
                    CaptureError::Protocol(_) => "Re-run with --verbose; a longer --settle-delay can help on busy pages.",
                };
                ErrorPayload::new(ErrorCategory::Capture, e.to_string(), remediation)
            }
            SdumpError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("playwright npm package is missing") {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        msg.to_string(),
                        "Install Playwright (e.g., `npm install playwright` and `npx playwright install chromium`).",
                    )
                } else if lower.contains("chromium executable") || lower.contains("executable doesn't exist") {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        msg.to_string(),
                        "Run `npx playwright install chromium` (or `playwright install chromium`) to download the browser.",
                    )
                } else if lower.contains("spawn playwright helper")
                    || lower.contains("node command")
                    || lower.contains("not found on path")
                {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        msg.to_string(),
                        "Install Node.js and ensure the node binary is on PATH; rerun after installing Playwright if needed.",
                    )
                } else if lower.contains("timeout") || lower.contains("timed out") {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        msg.to_string(),
                        "Try increasing --nav-timeout/--network-idle-timeout/--process-timeout or ensure the page loads without blocking.",
                    )
                } else if lower.contains("playwright") {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        msg.to_string(),
                        "Re-run with --verbose to see the helper's progress.",
                    )
                } else if lower.contains("settle") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Keep capture.settle_delay and --settle-delay at or below 10s.",
                    )
                } else if lower.contains("file not found") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Verify the page model exists; use an absolute path or run from the working directory.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags/paths (e.g., --viewport WIDTHxHEIGHT) and the config file.",
                    )
                }
            }
            SdumpError::Unknown(msg) => ErrorPayload::new(
                ErrorCategory::Unknown,
                msg.to_string(),
                "Re-run with --verbose; file an issue if persistent.",
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, SdumpError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Browser,
    Extraction,
    Capture,
    Image,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostError;

    #[test]
    fn missing_playwright_is_a_browser_error() {
        let err = SdumpError::Config(
            "Playwright npm package is missing; install with `npm install playwright`.".to_string(),
        );
        let payload = err.to_payload();
        assert_eq!(payload.category, ErrorCategory::Browser);
        let remediation = payload.remediation.unwrap_or_default();
        assert!(
            remediation.contains("npm install playwright"),
            "expected remediation to mention npm install playwright, got: {remediation}"
        );
    }

    #[test]
    fn generic_config_errors_use_default_remediation() {
        let payload = SdumpError::Config("Some other config issue".to_string()).to_payload();
        assert_eq!(payload.category, ErrorCategory::Config);
        assert!(payload
            .remediation
            .unwrap_or_default()
            .contains("Check flags/paths"));
    }

    #[test]
    fn node_spawn_failure_mentions_node() {
        let err = SdumpError::Config(
            "Unable to spawn Playwright helper; 'node' was not found on PATH".to_string(),
        );
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(remediation.to_ascii_lowercase().contains("node"));
    }

    #[test]
    fn timeouts_point_at_timeout_flags() {
        let err = SdumpError::Config(
            "Playwright error (status error): Timeout navigating to https://example.com"
                .to_string(),
        );
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(remediation.contains("--nav-timeout"), "got: {remediation}");
    }

    #[test]
    fn chromium_missing_suggests_install() {
        let err = SdumpError::Config("chromium executable is missing".to_string());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(remediation.contains("playwright install chromium"));
    }

    #[test]
    fn extraction_errors_keep_their_message() {
        let err = SdumpError::from(ExtractError::Host(HostError::InvalidSelector {
            selector: "div[".into(),
            reason: "unexpected end of selector".into(),
        }));
        let payload = err.to_payload();
        assert_eq!(payload.category, ErrorCategory::Extraction);
        assert!(payload.message.contains("div["), "got: {}", payload.message);
    }

    #[test]
    fn capture_errors_are_categorized() {
        let payload = SdumpError::from(CaptureError::ZeroDimensions).to_payload();
        assert_eq!(payload.category, ErrorCategory::Capture);
        assert_eq!(payload.message, "Element has zero dimensions");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["category"], "capture");
    }
}
