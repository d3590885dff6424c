//! Core types used throughout the sdump library.
//!
//! - [`ResourceKind`] - Input type classification
//! - [`BoundingBox`] - Element positioning in CSS pixels

use serde::{Deserialize, Serialize};

pub use crate::viewport::Viewport;

/// Classification of input resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Web URL to be rendered via Playwright
    Url,
    /// Previously captured page model (JSON)
    PageModel,
}

/// Rectangle bounds for an element, relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}
