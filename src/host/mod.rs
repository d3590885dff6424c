//! Host environment boundary.
//!
//! The cascade engine never touches a browser directly. Everything it
//! needs (DOM navigation, stylesheets, computed styles, selector matching,
//! condition evaluation and an isolated probe context for UA defaults) is
//! requested through [`StyleHost`]. Every accessor that a real browser can
//! refuse is fallible so callers decide locally how to absorb failures.

use thiserror::Error;

use crate::markup::MarkupElement;
use crate::types::{ComputedStyle, Declaration, PropertyMap, PseudoElement, StyleSheet};

/// Opaque handle to an element owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("'{selector}' is not a valid selector: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Stylesheet is not accessible: {0}")]
    Inaccessible(String),

    #[error("Condition cannot be evaluated: {0}")]
    Unevaluable(String),

    #[error("Unknown element handle {0:?}")]
    UnknownElement(ElementId),

    #[error("Host capability unavailable: {0}")]
    Unavailable(String),
}

impl HostError {
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        HostError::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Services the cascade engine consumes from the inspected document.
pub trait StyleHost {
    /// First element in document order matching `selector`.
    fn query_selector(&self, selector: &str) -> HostResult<Option<ElementId>>;

    fn body(&self) -> Option<ElementId>;

    fn document_element(&self) -> Option<ElementId>;

    /// Whether `el` refers to a live element of this document.
    fn is_element(&self, el: ElementId) -> bool;

    /// Every element strictly inside `el`, in document order.
    fn descendants(&self, el: ElementId) -> Vec<ElementId>;

    fn parent_element(&self, el: ElementId) -> Option<ElementId>;

    fn element_children(&self, el: ElementId) -> Vec<ElementId>;

    /// Lowercase tag name.
    fn tag_name(&self, el: ElementId) -> &str;

    fn id(&self, el: ElementId) -> Option<&str>;

    /// Raw `class` attribute.
    fn class_name(&self, el: ElementId) -> Option<&str>;

    fn text_content(&self, el: ElementId) -> String;

    /// Declarations of the element's `style` attribute.
    fn inline_style(&self, el: ElementId) -> HostResult<Vec<Declaration>>;

    fn computed_style(
        &self,
        el: ElementId,
        pseudo: Option<PseudoElement>,
    ) -> HostResult<ComputedStyle>;

    fn style_sheets(&self) -> &[StyleSheet];

    fn match_media(&self, query: &str) -> HostResult<bool>;

    fn supports(&self, condition: &str) -> HostResult<bool>;

    fn matches(&self, el: ElementId, selector: &str) -> HostResult<bool>;

    /// Create an isolated, inert context for probing UA defaults.
    ///
    /// The returned sandbox is torn down when dropped.
    fn create_sandbox(&self) -> HostResult<Box<dyn BaselineSandbox + '_>>;

    /// Deep clone of `el` and its subtree.
    fn clone_subtree(&self, el: ElementId) -> HostResult<MarkupElement>;

    /// Class list in attribute order.
    fn class_list(&self, el: ElementId) -> Vec<&str> {
        self.class_name(el)
            .map(|classes| classes.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// Throwaway rendering context with no author styles.
///
/// Implementations must release whatever they hold in `Drop`.
pub trait BaselineSandbox {
    /// Resolved style of a bare `tag` element (or one of its pseudo-elements).
    fn probe(&mut self, tag: &str, pseudo: Option<PseudoElement>) -> HostResult<PropertyMap>;
}
