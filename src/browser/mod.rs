//! Browser automation for page models and screenshots.
//!
//! Pages are loaded with Playwright via Node.js. A loaded page is either
//! serialized into a [`PageModel`](crate::page::PageModel) for style
//! extraction or captured as a screenshot.
//!
//! # Module Structure
//!
//! - [`manager`] - Browser session management with concurrency control
//! - [`playwright`] - Playwright scripts and availability checks
//! - [`screenshot`] - Cropping and saving raw captures
//!
//! # Example
//!
//! ```no_run
//! use sdump_lib::{BrowserManager, BrowserOptions};
//! use url::Url;
//!
//! # async fn example() -> sdump_lib::Result<()> {
//! let manager = BrowserManager::new(BrowserOptions::default());
//! let url = Url::parse("https://example.com")?;
//! let page = manager.capture_page(&url, Some("main")).await?;
//! println!("{} elements", page.elements.len());
//! # Ok(())
//! # }
//! ```

mod manager;
mod playwright;
mod screenshot;

pub use manager::{
    BrowserManager, BrowserOptions, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_NETWORK_IDLE_TIMEOUT,
    DEFAULT_PROCESS_TIMEOUT, DEFAULT_SCROLL_SETTLE, DEFAULT_SETTLE_DELAY,
};
pub use playwright::{MOCK_CAPTURE_ENV, MOCK_PAGE_ENV};
pub use screenshot::{save_capture, RawCapture, SavedScreenshot, ScreenshotTarget};
