use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::types::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResource {
    /// A page to load in the browser.
    Url(Url),
    /// A page model captured earlier.
    PageModel(PathBuf),
}

impl ParsedResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ParsedResource::Url(_) => ResourceKind::Url,
            ParsedResource::PageModel(_) => ResourceKind::PageModel,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResourceParseError {
    #[error("Invalid URL '{value}': {message}. Hint: include http(s):// and ensure the URL is well-formed.")]
    InvalidUrl { value: String, message: String },
    #[error("Local file not found: {path}. Hint: check the path relative to the current working directory or use an absolute path.")]
    FileNotFound { path: String },
    #[error("Unsupported input '{value}'. Pass an http(s) URL or a page model (.json).")]
    Unsupported { value: String },
}

/// Classify an `--input` value.
pub fn parse_resource(value: &str) -> Result<ParsedResource, ResourceParseError> {
    let trimmed = value.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return parse_url(trimmed).map(ParsedResource::Url);
    }
    if trimmed.starts_with("file://") {
        let url = parse_url(trimmed)?;
        let is_json = url.path().to_ascii_lowercase().ends_with(".json");
        if is_json {
            if let Ok(path) = url.to_file_path() {
                return parse_local(&path);
            }
        }
        return Ok(ParsedResource::Url(url));
    }
    parse_local(Path::new(trimmed))
}

/// Parse a URL the browser should open; only http(s) and file schemes qualify.
pub fn parse_url(value: &str) -> Result<Url, ResourceParseError> {
    let url = Url::parse(value).map_err(|e| ResourceParseError::InvalidUrl {
        value: value.to_string(),
        message: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" | "file" => Ok(url),
        other => Err(ResourceParseError::InvalidUrl {
            value: value.to_string(),
            message: format!("unsupported scheme '{}'", other),
        }),
    }
}

fn parse_local(path: &Path) -> Result<ParsedResource, ResourceParseError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(ResourceParseError::Unsupported {
            value: path.display().to_string(),
        });
    }
    if !path.is_file() {
        return Err(ResourceParseError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(ParsedResource::PageModel(path.to_path_buf()))
}
