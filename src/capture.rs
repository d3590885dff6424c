//! Screenshot requests, element cropping and file naming.
//!
//! The browser helper only ever produces two kinds of images: the visible
//! viewport and the full scrollable page. Element shots are a viewport
//! capture cropped to the element's box, scaled by the device pixel ratio.

use chrono::NaiveDateTime;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::types::BoundingBox;

const FILENAME_PART_MAX: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureKind {
    /// What is currently in the viewport.
    Visible,
    /// One element, cropped out of a viewport capture.
    Element,
    /// The whole scrollable page.
    FullPage,
}

impl CaptureKind {
    /// Leading part of the generated file name.
    pub fn file_prefix(self) -> &'static str {
        match self {
            CaptureKind::Visible => "page",
            CaptureKind::Element => "element",
            CaptureKind::FullPage => "fullpage",
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureKind::Visible => "visible",
            CaptureKind::Element => "element",
            CaptureKind::FullPage => "full-page",
        };
        f.write_str(name)
    }
}

impl FromStr for CaptureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visible" | "page" => Ok(CaptureKind::Visible),
            "element" => Ok(CaptureKind::Element),
            "full-page" | "fullpage" | "full" => Ok(CaptureKind::FullPage),
            other => Err(format!("unknown capture target '{}'", other)),
        }
    }
}

/// Message sent to the capture helper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CaptureRequest {
    CaptureVisibleTab,
    CaptureElement {
        bounds: ElementBounds,
        #[serde(rename = "devicePixelRatio")]
        device_pixel_ratio: f64,
    },
    CaptureFullPage,
}

impl CaptureRequest {
    pub fn kind(&self) -> CaptureKind {
        match self {
            CaptureRequest::CaptureVisibleTab => CaptureKind::Visible,
            CaptureRequest::CaptureElement { .. } => CaptureKind::Element,
            CaptureRequest::CaptureFullPage => CaptureKind::FullPage,
        }
    }
}

/// Viewport-relative box of an element plus what is needed to name the shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub hostname: String,
}

fn default_device_pixel_ratio() -> f64 {
    1.0
}

impl ElementBounds {
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Element id, else its first class, else its tag.
    pub fn identifier(&self) -> &str {
        if !self.id.is_empty() {
            return &self.id;
        }
        match self.class_name.split(' ').next() {
            Some(first) if !first.is_empty() => first,
            _ => &self.tag_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Element not found")]
    ElementNotFound,

    #[error("No element selected. Pass --selector or capture a page with an inspected element.")]
    NoElementSelected,

    #[error("Element has zero dimensions")]
    ZeroDimensions,

    #[error("Element lies outside the captured viewport")]
    OutsideViewport,

    #[error("{0}")]
    Protocol(String),
}

impl CaptureError {
    /// Map a failure message reported by the capture helper.
    pub fn from_helper_message(message: &str) -> Self {
        let trimmed = message.trim();
        match trimmed {
            "Element not found" => CaptureError::ElementNotFound,
            "Element has zero dimensions" => CaptureError::ZeroDimensions,
            m if m.starts_with("No element selected") => CaptureError::NoElementSelected,
            m => CaptureError::Protocol(m.to_string()),
        }
    }
}

/// Crop a viewport capture to `bounds`.
///
/// The box is scaled by the device pixel ratio and clamped to the image.
pub fn crop_to_bounds(
    image: &DynamicImage,
    bounds: &ElementBounds,
) -> Result<DynamicImage, CaptureError> {
    if bounds.bounding_box().is_empty() {
        return Err(CaptureError::ZeroDimensions);
    }

    let dpr = if bounds.device_pixel_ratio > 0.0 {
        bounds.device_pixel_ratio
    } else {
        1.0
    };
    let img_w = f64::from(image.width());
    let img_h = f64::from(image.height());

    let crop_x = (bounds.x * dpr).max(0.0).floor();
    let crop_y = (bounds.y * dpr).max(0.0).floor();
    let crop_w = (bounds.width * dpr).min(img_w - crop_x).floor();
    let crop_h = (bounds.height * dpr).min(img_h - crop_y).floor();

    if crop_w < 1.0 || crop_h < 1.0 {
        return Err(CaptureError::OutsideViewport);
    }

    Ok(image.crop_imm(
        crop_x as u32,
        crop_y as u32,
        crop_w as u32,
        crop_h as u32,
    ))
}

/// `<kind>_<host>[_<identifier>]_<YYYYMMDD-HHMMSS>.png`
pub fn screenshot_filename(
    kind: CaptureKind,
    hostname: Option<&str>,
    identifier: Option<&str>,
    at: NaiveDateTime,
) -> String {
    let host = clean_hostname(hostname.unwrap_or_default());
    let id = clean_identifier(identifier.unwrap_or_default());

    let mut parts = vec![kind.file_prefix().to_string(), host];
    if !id.is_empty() {
        parts.push(id);
    }
    parts.push(at.format("%Y%m%d-%H%M%S").to_string());
    format!("{}.png", parts.join("_"))
}

fn clean_hostname(hostname: &str) -> String {
    let host = if hostname.is_empty() { "page" } else { hostname };
    host.strip_prefix("www.")
        .unwrap_or(host)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(FILENAME_PART_MAX)
        .collect()
}

fn clean_identifier(identifier: &str) -> String {
    let mut out = String::new();
    for c in identifier.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.chars().take(FILENAME_PART_MAX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(9, 5, 2))
            .unwrap()
    }

    fn bounds(x: f64, y: f64, width: f64, height: f64, dpr: f64) -> ElementBounds {
        ElementBounds {
            x,
            y,
            width,
            height,
            device_pixel_ratio: dpr,
            scroll_x: 0.0,
            scroll_y: 0.0,
            tag_name: "div".into(),
            id: String::new(),
            class_name: String::new(),
            hostname: "example.com".into(),
        }
    }

    #[test]
    fn filenames_follow_the_pattern() {
        assert_eq!(
            screenshot_filename(CaptureKind::Element, Some("www.example.com"), Some("hero"), at()),
            "element_example.com_hero_20240307-090502.png"
        );
        assert_eq!(
            screenshot_filename(CaptureKind::Visible, None, Some("My Page: Home!!"), at()),
            "page_page_My_Page_Home_20240307-090502.png"
        );
        assert_eq!(
            screenshot_filename(CaptureKind::FullPage, Some("localhost:8080"), None, at()),
            "fullpage_localhost_8080_20240307-090502.png"
        );
    }

    #[test]
    fn filename_parts_are_truncated() {
        let long = "a".repeat(50);
        let name = screenshot_filename(CaptureKind::Element, Some(&long), Some(&long), at());
        let parts: Vec<&str> = name.trim_end_matches(".png").split('_').collect();
        assert_eq!(parts[1].len(), 30);
        assert_eq!(parts[2].len(), 30);
    }

    #[test]
    fn identifier_prefers_id_then_first_class_then_tag() {
        let mut b = bounds(0.0, 0.0, 1.0, 1.0, 1.0);
        assert_eq!(b.identifier(), "div");
        b.class_name = "card wide".into();
        assert_eq!(b.identifier(), "card");
        b.id = "main".into();
        assert_eq!(b.identifier(), "main");
    }

    #[test]
    fn crop_scales_by_device_pixel_ratio() {
        let mut img = RgbaImage::new(200, 100);
        img.put_pixel(20, 10, Rgba([255, 0, 0, 255]));
        let image = DynamicImage::ImageRgba8(img);

        let cropped = crop_to_bounds(&image, &bounds(10.0, 5.0, 30.0, 20.0, 2.0)).unwrap();
        assert_eq!(cropped.dimensions(), (60, 40));
        assert_eq!(cropped.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn crop_is_clamped_to_the_image() {
        let image = DynamicImage::new_rgba8(100, 50);
        let cropped = crop_to_bounds(&image, &bounds(-10.0, 40.0, 500.0, 30.0, 1.0)).unwrap();
        assert_eq!(cropped.dimensions(), (100, 10));

        assert_eq!(
            crop_to_bounds(&image, &bounds(120.0, 0.0, 10.0, 10.0, 1.0)).unwrap_err(),
            CaptureError::OutsideViewport
        );
    }

    #[test]
    fn zero_sized_elements_are_rejected() {
        let image = DynamicImage::new_rgba8(10, 10);
        let err = crop_to_bounds(&image, &bounds(0.0, 0.0, 0.0, 5.0, 1.0)).unwrap_err();
        assert_eq!(err.to_string(), "Element has zero dimensions");
    }

    #[test]
    fn helper_messages_map_to_variants() {
        assert_eq!(
            CaptureError::from_helper_message("Element not found"),
            CaptureError::ElementNotFound
        );
        assert_eq!(
            CaptureError::from_helper_message("No element selected. Select one first."),
            CaptureError::NoElementSelected
        );
        assert_eq!(
            CaptureError::from_helper_message(" Target closed "),
            CaptureError::Protocol("Target closed".into())
        );
    }

    #[test]
    fn requests_serialize_with_action_tag() {
        let json = serde_json::to_value(CaptureRequest::CaptureFullPage).unwrap();
        assert_eq!(json, serde_json::json!({"action": "captureFullPage"}));

        let request = CaptureRequest::CaptureElement {
            bounds: bounds(1.0, 2.0, 3.0, 4.0, 2.0),
            device_pixel_ratio: 2.0,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"], "captureElement");
        assert_eq!(json["devicePixelRatio"], 2.0);
        assert_eq!(json["bounds"]["tagName"], "div");
        assert_eq!(request.kind(), CaptureKind::Element);
    }
}
