//! Owned markup tree used for HTML export.
//!
//! A host hands out a deep clone of a subtree; the exporter mutates the
//! clone's `style` attributes and serializes it back to HTML through
//! html5ever's serializer.

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};
use std::collections::BTreeMap;
use std::io;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupElement {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<MarkupNode>,
}

impl MarkupElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Visit this element and every descendant element in preorder.
    ///
    /// The visitor returns `false` to stop the walk early.
    pub fn walk_elements_mut<F>(&mut self, visit: &mut F) -> bool
    where
        F: FnMut(&mut MarkupElement) -> bool,
    {
        if !visit(self) {
            return false;
        }
        for child in &mut self.children {
            if let MarkupNode::Element(el) = child {
                if !el.walk_elements_mut(visit) {
                    return false;
                }
            }
        }
        true
    }

    /// Serialize as HTML, the way `outerHTML` does.
    pub fn outer_html(&self) -> String {
        let mut out = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::IncludeNode,
            ..SerializeOpts::default()
        };
        // Writing into a Vec cannot fail.
        let _ = serialize(&mut out, self, opts);
        String::from_utf8_lossy(&out).into_owned()
    }

    fn qual_name(&self) -> QualName {
        QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from(self.tag.as_str()),
        )
    }
}

impl Serialize for MarkupElement {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let include_node = matches!(traversal_scope, TraversalScope::IncludeNode);
        if include_node {
            let attrs: Vec<(QualName, &str)> = self
                .attributes
                .iter()
                .map(|(name, value)| {
                    let name =
                        QualName::new(None, Namespace::from(""), LocalName::from(name.as_str()));
                    (name, value.as_str())
                })
                .collect();
            serializer.start_elem(
                self.qual_name(),
                attrs.iter().map(|(name, value)| (name, *value)),
            )?;
        }
        for child in &self.children {
            match child {
                MarkupNode::Element(el) => el.serialize(serializer, TraversalScope::IncludeNode)?,
                MarkupNode::Text(text) => serializer.write_text(text)?,
            }
        }
        if include_node {
            serializer.end_elem(self.qual_name())?;
        }
        Ok(())
    }
}
