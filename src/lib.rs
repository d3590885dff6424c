//! Style Dumper (sdump) Library
//!
//! Explains which CSS rules style an element and exports those styles,
//! optionally with the element's markup and styles inlined. Pages come
//! from a live URL (rendered with Playwright) or from a page model JSON
//! captured earlier.
//!
//! # Module Overview
//!
//! - [`cascade`] - Rule collection, winner resolution and extraction
//! - [`host`] - The document interface the cascade engine queries
//! - [`page`] - Serialized page models implementing [`host::StyleHost`]
//! - [`browser`] - Headless browser automation for page models and screenshots
//! - [`capture`] - Screenshot requests, cropping and file naming
//! - [`config`] - Configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use sdump_lib::{extract, ExtractionRequest, ExtractionMode, PageModel};
//!
//! # fn example() -> sdump_lib::Result<()> {
//! let page = PageModel::from_json(&std::fs::read_to_string("page.json")?)?;
//! let request = ExtractionRequest {
//!     selector: Some("#card".into()),
//!     mode: ExtractionMode::Rules,
//!     ..ExtractionRequest::default()
//! };
//! let result = extract(&page, &request, page.inspected_element())?;
//! for node in &result.nodes {
//!     println!("{}: {} properties", node.path, node.styles.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod capture;
pub mod cascade;
pub mod config;
pub mod error;
pub mod host;
pub mod markup;
pub mod output;
pub mod page;
pub mod progress;
pub mod resource;
pub mod types;
pub mod viewport;

pub use browser::{
    BrowserManager, BrowserOptions, SavedScreenshot, ScreenshotTarget,
    DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_NETWORK_IDLE_TIMEOUT, DEFAULT_PROCESS_TIMEOUT,
};
pub use capture::{CaptureError, CaptureKind};
pub use cascade::{
    extract, ExtractError, ExtractionMode, ExtractionRequest, ExtractionResponse,
    ExtractionResult,
};
pub use config::Config;
pub use error::{ErrorCategory, ErrorPayload, Result, SdumpError};
pub use output::{CaptureOutput, ErrorOutput, HtmlExport, SdumpOutput};
pub use page::PageModel;
pub use progress::{stderr_progress, ProgressCallback};
pub use resource::{parse_resource, ParsedResource};
pub use types::ResourceKind;
pub use viewport::Viewport;
