//! Turning a raw capture from the helper into a named PNG on disk.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::{crop_to_bounds, screenshot_filename, CaptureKind, CaptureRequest, ElementBounds};
use crate::Result;

/// What the user asked to capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotTarget {
    pub kind: CaptureKind,
    /// Required for [`CaptureKind::Element`].
    pub selector: Option<String>,
}

/// Success output of the capture helper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCapture {
    pub image_path: PathBuf,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(flatten)]
    pub request: CaptureRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedScreenshot {
    pub kind: CaptureKind,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<ElementBounds>,
}

/// Decode `raw`, crop element shots and write the result into `output_dir`.
pub fn save_capture(raw: &RawCapture, output_dir: &Path, at: NaiveDateTime) -> Result<SavedScreenshot> {
    let image = image::open(&raw.image_path)?;

    let (image, identifier, hostname, bounds) = match &raw.request {
        CaptureRequest::CaptureElement {
            bounds,
            device_pixel_ratio,
        } => {
            let mut bounds = bounds.clone();
            bounds.device_pixel_ratio = *device_pixel_ratio;
            let cropped = crop_to_bounds(&image, &bounds)?;
            let hostname = if bounds.hostname.is_empty() {
                raw.hostname.clone()
            } else {
                bounds.hostname.clone()
            };
            (cropped, bounds.identifier().to_string(), hostname, Some(bounds))
        }
        CaptureRequest::CaptureVisibleTab | CaptureRequest::CaptureFullPage => {
            (image, raw.title.clone(), raw.hostname.clone(), None)
        }
    };

    let kind = raw.request.kind();
    let filename = screenshot_filename(
        kind,
        Some(hostname.as_str()).filter(|h| !h.is_empty()),
        Some(identifier.as_str()).filter(|i| !i.is_empty()),
        at,
    );

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(filename);
    image.save_with_format(&path, image::ImageFormat::Png)?;

    Ok(SavedScreenshot {
        kind,
        path,
        width: image.width(),
        height: image.height(),
        bounds,
    })
}
