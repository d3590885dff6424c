//! Captured page snapshot usable as a [`StyleHost`].
//!
//! A [`PageModel`] is what the browser capture script serializes: the
//! element tree, every element's inline declarations and computed style,
//! the stylesheet rule trees, the verdicts of every `@media`/`@supports`
//! condition found in those sheets and the UA baseline probes. The cascade
//! engine runs against it exactly as it would against a live document.

mod sandbox;
pub mod selector;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub use sandbox::{baseline_key, PageSandbox};
use selector::{SelectorError, SelectorList, SelectorTree};
use selectors::OpaqueElement;

use crate::host::{BaselineSandbox, ElementId, HostError, HostResult, StyleHost};
use crate::markup::{MarkupElement, MarkupNode};
use crate::types::{ComputedStyle, Declaration, PropertyMap, PseudoElement, StyleSheet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub document_element: Option<usize>,
    #[serde(default)]
    pub body: Option<usize>,
    /// Element selected with `--inspect` at capture time.
    #[serde(default)]
    pub inspected: Option<usize>,
    #[serde(default)]
    pub elements: Vec<PageElement>,
    #[serde(default)]
    pub style_sheets: Vec<StyleSheet>,
    #[serde(default)]
    pub media_queries: BTreeMap<String, bool>,
    #[serde(default)]
    pub supports_queries: BTreeMap<String, bool>,
    /// UA defaults keyed by `tag` or `tag|::before` / `tag|::after`.
    #[serde(default)]
    pub baseline: BTreeMap<String, PropertyMap>,

    #[serde(skip)]
    sandboxes_created: Cell<usize>,
    #[serde(skip)]
    live_sandboxes: Cell<usize>,
    #[serde(skip)]
    selectors: RefCell<HashMap<String, Result<SelectorList, SelectorError>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub children: Vec<PageNode>,
    #[serde(default)]
    pub inline_style: Vec<Declaration>,
    #[serde(default)]
    pub computed_style: ComputedStyle,
    #[serde(default)]
    pub pseudo_styles: BTreeMap<PseudoElement, ComputedStyle>,
}

/// Structural defects that make a serialized page model unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{field} refers to element {index}, which does not exist")]
    MissingElement { field: &'static str, index: usize },
    #[error("element {child} is listed under element {parent} but records parent {actual:?}")]
    ParentMismatch {
        parent: usize,
        child: usize,
        actual: Option<usize>,
    },
    #[error("element {0} is listed as a child more than once")]
    SharedChild(usize),
    #[error("element {child} names element {parent} as parent but is not among its children")]
    Orphan { parent: usize, child: usize },
    #[error("element {0} is its own ancestor")]
    Cycle(usize),
}

/// Child node of an element: another element (by index) or a text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageNode {
    Element { element: usize },
    Text { text: String },
}

impl PageModel {
    /// Parse a serialized page model, check its tree and normalize
    /// tag/attribute case.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let page: PageModel = serde_json::from_str(json)?;
        page.normalized().map_err(serde_json::Error::custom)
    }

    pub(crate) fn normalized(mut self) -> Result<Self, ModelError> {
        self.validate()?;
        self.normalize();
        Ok(self)
    }

    /// Child lists and parent links must describe the same forest.
    fn validate(&self) -> Result<(), ModelError> {
        let len = self.elements.len();
        let in_range = |field: &'static str, index: usize| {
            if index < len {
                Ok(())
            } else {
                Err(ModelError::MissingElement { field, index })
            }
        };
        for (field, index) in [
            ("documentElement", self.document_element),
            ("body", self.body),
            ("inspected", self.inspected),
        ] {
            if let Some(index) = index {
                in_range(field, index)?;
            }
        }

        let mut listed = vec![false; len];
        for (parent, element) in self.elements.iter().enumerate() {
            for node in &element.children {
                let PageNode::Element { element: child } = *node else {
                    continue;
                };
                in_range("children", child)?;
                let actual = self.elements[child].parent;
                if actual != Some(parent) {
                    return Err(ModelError::ParentMismatch {
                        parent,
                        child,
                        actual,
                    });
                }
                if std::mem::replace(&mut listed[child], true) {
                    return Err(ModelError::SharedChild(child));
                }
            }
        }
        for (child, element) in self.elements.iter().enumerate() {
            if let Some(parent) = element.parent {
                in_range("parent", parent)?;
                if !listed[child] {
                    return Err(ModelError::Orphan { parent, child });
                }
            }
        }

        // Every element must hang off a root; whatever is left sits on a loop.
        let mut reached = vec![false; len];
        let mut stack: Vec<usize> = (0..len)
            .filter(|&i| self.elements[i].parent.is_none())
            .collect();
        while let Some(index) = stack.pop() {
            reached[index] = true;
            stack.extend(self.elements[index].children.iter().filter_map(|node| match node {
                PageNode::Element { element } => Some(*element),
                PageNode::Text { .. } => None,
            }));
        }
        match reached.iter().position(|&seen| !seen) {
            Some(index) => Err(ModelError::Cycle(index)),
            None => Ok(()),
        }
    }

    fn normalize(&mut self) {
        for element in &mut self.elements {
            element.tag.make_ascii_lowercase();
            if element.attributes.keys().any(|k| k.chars().any(|c| c.is_ascii_uppercase())) {
                element.attributes = std::mem::take(&mut element.attributes)
                    .into_iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v))
                    .collect();
            }
        }
    }

    pub fn inspected_element(&self) -> Option<ElementId> {
        self.inspected.map(ElementId)
    }

    /// Number of baseline sandboxes opened against this page so far.
    pub fn sandboxes_created(&self) -> usize {
        self.sandboxes_created.get()
    }

    /// Number of baseline sandboxes currently open.
    pub fn live_sandboxes(&self) -> usize {
        self.live_sandboxes.get()
    }

    fn element(&self, el: ElementId) -> Option<&PageElement> {
        self.elements.get(el.0)
    }

    fn checked(&self, el: ElementId) -> HostResult<&PageElement> {
        self.element(el).ok_or(HostError::UnknownElement(el))
    }

    fn valid(&self, index: Option<usize>) -> Option<ElementId> {
        index.filter(|&i| i < self.elements.len()).map(ElementId)
    }

    /// Every element in document order.
    pub fn document_order(&self) -> Vec<ElementId> {
        let mut out = Vec::with_capacity(self.elements.len());
        for (index, element) in self.elements.iter().enumerate() {
            if element.parent.is_none() {
                out.push(ElementId(index));
                self.push_descendants(ElementId(index), &mut out);
            }
        }
        out
    }

    fn push_descendants(&self, el: ElementId, out: &mut Vec<ElementId>) {
        let mut stack: Vec<ElementId> = self.child_elements(el).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.child_elements(next).into_iter().rev());
        }
    }

    fn child_elements(&self, el: ElementId) -> Vec<ElementId> {
        let Some(element) = self.element(el) else {
            return Vec::new();
        };
        element
            .children
            .iter()
            .filter_map(|node| match node {
                PageNode::Element { element } => self.valid(Some(*element)),
                PageNode::Text { .. } => None,
            })
            .collect()
    }

    fn push_text(&self, el: ElementId, out: &mut String) {
        let mut stack: Vec<&PageNode> = match self.element(el) {
            Some(element) => element.children.iter().rev().collect(),
            None => return,
        };
        while let Some(node) = stack.pop() {
            match node {
                PageNode::Text { text } => out.push_str(text),
                PageNode::Element { element } => {
                    if let Some(child) = self.element(ElementId(*element)) {
                        stack.extend(child.children.iter().rev());
                    }
                }
            }
        }
    }

    fn with_selector<R>(
        &self,
        selector: &str,
        run: impl FnOnce(&SelectorList) -> R,
    ) -> HostResult<R> {
        let mut cache = self.selectors.borrow_mut();
        let parsed = cache
            .entry(selector.to_string())
            .or_insert_with(|| SelectorList::parse(selector));
        match &*parsed {
            Ok(list) => Ok(run(list)),
            Err(err) => Err(HostError::invalid_selector(selector, err.to_string())),
        }
    }

    fn markup(&self, el: ElementId) -> HostResult<MarkupElement> {
        let element = self.checked(el)?;
        let mut out = MarkupElement::new(element.tag.clone());
        out.attributes = element.attributes.clone();
        for node in &element.children {
            match node {
                PageNode::Text { text } => out.children.push(MarkupNode::Text(text.clone())),
                PageNode::Element { element } => {
                    let child = self.markup(ElementId(*element))?;
                    out.children.push(MarkupNode::Element(child));
                }
            }
        }
        Ok(out)
    }
}

impl SelectorTree for PageModel {
    fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.element(el).and_then(|e| self.valid(e.parent))
    }

    fn children(&self, el: ElementId) -> Vec<ElementId> {
        self.child_elements(el)
    }

    fn local_name(&self, el: ElementId) -> &str {
        self.element(el).map(|e| e.tag.as_str()).unwrap_or("")
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<&str> {
        self.element(el)?.attributes.get(name).map(String::as_str)
    }

    fn opaque(&self, el: ElementId) -> OpaqueElement {
        match self.element(el) {
            Some(element) => OpaqueElement::new(element),
            None => OpaqueElement::new(self),
        }
    }

    fn has_content(&self, el: ElementId) -> bool {
        self.element(el).is_some_and(|e| {
            e.children.iter().any(|node| match node {
                PageNode::Element { .. } => true,
                PageNode::Text { text } => !text.is_empty(),
            })
        })
    }
}

impl StyleHost for PageModel {
    fn query_selector(&self, selector: &str) -> HostResult<Option<ElementId>> {
        self.with_selector(selector, |list| {
            self.document_order()
                .into_iter()
                .find(|&el| list.matches(self, el))
        })
    }

    fn body(&self) -> Option<ElementId> {
        self.valid(self.body)
    }

    fn document_element(&self) -> Option<ElementId> {
        self.valid(self.document_element)
    }

    fn is_element(&self, el: ElementId) -> bool {
        self.element(el).is_some()
    }

    fn descendants(&self, el: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.push_descendants(el, &mut out);
        out
    }

    fn parent_element(&self, el: ElementId) -> Option<ElementId> {
        SelectorTree::parent(self, el)
    }

    fn element_children(&self, el: ElementId) -> Vec<ElementId> {
        self.child_elements(el)
    }

    fn tag_name(&self, el: ElementId) -> &str {
        self.local_name(el)
    }

    fn id(&self, el: ElementId) -> Option<&str> {
        self.attribute(el, "id")
    }

    fn class_name(&self, el: ElementId) -> Option<&str> {
        self.attribute(el, "class")
    }

    fn text_content(&self, el: ElementId) -> String {
        let mut out = String::new();
        self.push_text(el, &mut out);
        out
    }

    fn inline_style(&self, el: ElementId) -> HostResult<Vec<Declaration>> {
        Ok(self.checked(el)?.inline_style.clone())
    }

    fn computed_style(
        &self,
        el: ElementId,
        pseudo: Option<PseudoElement>,
    ) -> HostResult<ComputedStyle> {
        let element = self.checked(el)?;
        Ok(match pseudo {
            None => element.computed_style.clone(),
            Some(which) => element
                .pseudo_styles
                .get(&which)
                .cloned()
                .unwrap_or_default(),
        })
    }

    fn style_sheets(&self) -> &[StyleSheet] {
        &self.style_sheets
    }

    fn match_media(&self, query: &str) -> HostResult<bool> {
        let query = query.trim();
        if let Some(&verdict) = self.media_queries.get(query) {
            return Ok(verdict);
        }
        match query.to_ascii_lowercase().as_str() {
            "" | "all" | "screen" | "only screen" => Ok(true),
            "print" | "speech" | "not all" => Ok(false),
            _ => Err(HostError::Unevaluable(format!("@media {}", query))),
        }
    }

    fn supports(&self, condition: &str) -> HostResult<bool> {
        self.supports_queries
            .get(condition.trim())
            .copied()
            .ok_or_else(|| HostError::Unevaluable(format!("@supports {}", condition.trim())))
    }

    fn matches(&self, el: ElementId, selector: &str) -> HostResult<bool> {
        self.checked(el)?;
        self.with_selector(selector, |list| list.matches(self, el))
    }

    fn create_sandbox(&self) -> HostResult<Box<dyn BaselineSandbox + '_>> {
        self.sandboxes_created.set(self.sandboxes_created.get() + 1);
        Ok(Box::new(PageSandbox::open(
            &self.baseline,
            &self.live_sandboxes,
        )))
    }

    fn clone_subtree(&self, el: ElementId) -> HostResult<MarkupElement> {
        self.markup(el)
    }
}
