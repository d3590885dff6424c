//! Extraction entry point: target resolution, traversal and HTML export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;

use super::snapshot::{ElementSnapshot, SnapshotBuilder};
use crate::host::{ElementId, HostError, StyleHost};
use crate::markup::MarkupElement;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Every non-empty computed property.
    #[default]
    All,
    /// Only properties set by matching rules, minus UA defaults.
    Rules,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::All => f.write_str("all"),
            ExtractionMode::Rules => f.write_str("rules"),
        }
    }
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ExtractionMode::All),
            "rules" => Ok(ExtractionMode::Rules),
            other => Err(format!("unknown extraction mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionRequest {
    pub selector: Option<String>,
    /// Fall back to the inspected element when no selector is given.
    #[serde(rename = "use$0")]
    pub use_inspected: bool,
    pub mode: ExtractionMode,
    pub children: bool,
    pub pseudo: bool,
    pub html: bool,
}

impl Default for ExtractionRequest {
    fn default() -> Self {
        Self {
            selector: None,
            use_inspected: true,
            mode: ExtractionMode::All,
            children: true,
            pseudo: true,
            html: false,
        }
    }
}

/// How the root element was found.
///
/// Names the strategy that produced the root, so a request that allowed
/// `$0` but had no inspected element reports `Body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSource {
    #[serde(rename = "selector")]
    Selector,
    #[serde(rename = "$0")]
    Inspected,
    #[serde(rename = "body")]
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    pub source: TargetSource,
    pub selector: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    pub node_count: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub target: TargetDescriptor,
    pub mode: ExtractionMode,
    pub include_children: bool,
    pub nodes: Vec<ElementSnapshot>,
    pub stats: ExtractionStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("No root element found")]
    NoRootElement,

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Wire form of an extraction outcome: the result, or `{ "error": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionResponse {
    Failure { error: String },
    Success(Box<ExtractionResult>),
}

impl ExtractionResponse {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExtractionResponse::Failure { .. })
    }
}

impl From<ExtractionResult> for ExtractionResponse {
    fn from(result: ExtractionResult) -> Self {
        ExtractionResponse::Success(Box::new(result))
    }
}

/// Resolve the root element for `request`.
///
/// An explicit selector never falls back: if it matches nothing there is
/// no root.
pub fn resolve_target<H: StyleHost + ?Sized>(
    host: &H,
    request: &ExtractionRequest,
    inspected: Option<ElementId>,
) -> Result<(ElementId, TargetSource), ExtractError> {
    if let Some(selector) = request.selector.as_deref().filter(|s| !s.trim().is_empty()) {
        return host
            .query_selector(selector)?
            .map(|el| (el, TargetSource::Selector))
            .ok_or(ExtractError::NoRootElement);
    }

    if request.use_inspected {
        if let Some(el) = inspected.filter(|&el| host.is_element(el)) {
            return Ok((el, TargetSource::Inspected));
        }
    }

    host.body()
        .map(|el| (el, TargetSource::Body))
        .ok_or(ExtractError::NoRootElement)
}

/// Run one extraction against `host`.
///
/// `inspected` is the element currently selected in the host's inspector,
/// if any.
pub fn extract<H: StyleHost + ?Sized>(
    host: &H,
    request: &ExtractionRequest,
    inspected: Option<ElementId>,
) -> Result<ExtractionResult, ExtractError> {
    let (root, source) = resolve_target(host, request, inspected)?;

    let mut elements = vec![root];
    if request.children {
        elements.extend(host.descendants(root));
    }

    let mut builder = SnapshotBuilder::new(host, request.mode, request.pseudo);
    let started = Instant::now();
    let nodes = elements
        .iter()
        .map(|&el| builder.collect_node(el))
        .collect::<Result<Vec<_>, _>>()?;
    let stats = ExtractionStats {
        node_count: nodes.len(),
        duration_ms: started.elapsed().as_millis().try_into().unwrap_or(u64::MAX),
    };

    let html = if request.html {
        let mut clone = host.clone_subtree(root)?;
        inline_styles(&mut clone, &nodes);
        Some(clone.outer_html())
    } else {
        None
    };
    builder.release();

    Ok(ExtractionResult {
        target: TargetDescriptor {
            source,
            selector: request.selector.clone(),
        },
        mode: request.mode,
        include_children: request.children,
        nodes,
        stats,
        html,
    })
}

/// Append each snapshot's styles to the matching clone element's `style`
/// attribute. Elements are paired in preorder, root first.
fn inline_styles(clone: &mut MarkupElement, nodes: &[ElementSnapshot]) {
    let mut remaining = nodes.iter();
    clone.walk_elements_mut(&mut |el| {
        let Some(snapshot) = remaining.next() else {
            return false;
        };
        let declarations = snapshot
            .styles
            .iter()
            .map(|(prop, value)| format!("{}: {};", prop, value))
            .collect::<Vec<_>>()
            .join(" ");
        let mut style = el.attribute("style").unwrap_or_default().trim_end().to_string();
        if !declarations.is_empty() {
            if !style.is_empty() {
                if !style.ends_with(';') {
                    style.push(';');
                }
                style.push(' ');
            }
            style.push_str(&declarations);
        }
        el.set_attribute("style", style);
        true
    });
}
