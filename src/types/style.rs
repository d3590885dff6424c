//! Stylesheet object model shared by every [`StyleHost`](crate::host::StyleHost).
//!
//! Rules form a closed variant resolved once by the host adapter, so the
//! collector never sniffs rule shapes at traversal time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::host::{HostError, HostResult};

/// Property name to value, ordered by property name.
pub type PropertyMap = BTreeMap<String, String>;

/// Generated-content pseudo-elements the engine resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PseudoElement {
    #[serde(rename = "::before")]
    Before,
    #[serde(rename = "::after")]
    After,
}

impl PseudoElement {
    pub const ALL: [PseudoElement; 2] = [PseudoElement::Before, PseudoElement::After];

    /// Modern double-colon form, e.g. `::before`.
    pub fn as_str(self) -> &'static str {
        match self {
            PseudoElement::Before => "::before",
            PseudoElement::After => "::after",
        }
    }

    /// Legacy single-colon form, e.g. `:before`.
    pub fn legacy_str(self) -> &'static str {
        &self.as_str()[1..]
    }
}

impl fmt::Display for PseudoElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `property: value [!important]` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub property: String,
    pub value: String,
    #[serde(default)]
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }

    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }
}

/// Declaration block of a style rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationBlock {
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    /// Raw `cssText` as authored, shorthands intact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_text: Option<String>,
}

impl DeclarationBlock {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self {
            declarations,
            css_text: None,
        }
    }

    /// Names of the properties explicitly written in this block.
    ///
    /// Prefers the raw text so shorthands are reported as authored; falls
    /// back to the expanded declaration list.
    pub fn declared_names(&self) -> Vec<String> {
        match self.css_text.as_deref().filter(|text| !text.is_empty()) {
            Some(text) => text
                .split(';')
                .filter_map(|decl| {
                    let idx = decl.find(':')?;
                    if idx == 0 {
                        return None;
                    }
                    let name = decl[..idx].trim();
                    (!name.is_empty()).then(|| name.to_string())
                })
                .collect(),
            None => self
                .declarations
                .iter()
                .map(|decl| decl.property.clone())
                .collect(),
        }
    }
}

/// A rule as exposed by the stylesheet object model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CssRule {
    Style(StyleRule),
    Conditional(ConditionalRule),
    Group(GroupRule),
    /// Rules without a selector or nested rules (`@font-face`, `@import`, ...).
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRule {
    pub selector_text: String,
    #[serde(default)]
    pub style: DeclarationBlock,
}

impl StyleRule {
    pub fn new(selector_text: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            selector_text: selector_text.into(),
            style: DeclarationBlock::new(declarations),
        }
    }

    /// Top-level comma separated selectors, trimmed, empties dropped.
    pub fn selectors(&self) -> Vec<&str> {
        split_selector_list(&self.selector_text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Media,
    Supports,
}

impl ConditionKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ConditionKind::Media => "@media",
            ConditionKind::Supports => "@supports",
        }
    }
}

/// `@media` / `@supports` block, entered only when its condition holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRule {
    pub kind: ConditionKind,
    pub condition: String,
    #[serde(default)]
    pub rules: Vec<CssRule>,
}

impl ConditionalRule {
    pub fn media(condition: impl Into<String>, rules: Vec<CssRule>) -> Self {
        Self {
            kind: ConditionKind::Media,
            condition: condition.into(),
            rules,
        }
    }

    pub fn supports(condition: impl Into<String>, rules: Vec<CssRule>) -> Self {
        Self {
            kind: ConditionKind::Supports,
            condition: condition.into(),
            rules,
        }
    }
}

/// Any other rule carrying nested rules (`@layer` blocks, `@container`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRule {
    #[serde(default)]
    pub rules: Vec<CssRule>,
}

/// A stylesheet whose rules may be unreadable (e.g. cross-origin).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSheet {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<CssRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StyleSheet {
    pub fn new(rules: Vec<CssRule>) -> Self {
        Self {
            href: None,
            rules: Some(rules),
            error: None,
        }
    }

    pub fn css_rules(&self) -> HostResult<&[CssRule]> {
        match &self.rules {
            Some(rules) => Ok(rules),
            None => Err(HostError::Inaccessible(
                self.error
                    .clone()
                    .unwrap_or_else(|| "cssRules unavailable".to_string()),
            )),
        }
    }
}

/// Resolved style of an element as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputedStyle(PropertyMap);

impl ComputedStyle {
    pub fn new(values: PropertyMap) -> Self {
        Self(values)
    }

    /// Mirrors `getPropertyValue`: unknown properties read as empty.
    pub fn property_value(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    /// Every property with a non-empty value.
    pub fn visible(&self) -> PropertyMap {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn into_inner(self) -> PropertyMap {
        self.0
    }
}

impl FromIterator<(String, String)> for ComputedStyle {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Split a selector list on commas that are not nested in parentheses,
/// brackets or quotes.
pub fn split_selector_list(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut escaped = false;

    for (idx, ch) in list.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&list[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_list_splits_on_top_level_commas_only() {
        let parts = split_selector_list(".a, :is(.b, .c) > p ,[data-x=\"1,2\"]");
        assert_eq!(parts, vec![".a", ":is(.b, .c) > p", "[data-x=\"1,2\"]"]);
    }

    #[test]
    fn selector_list_drops_empty_entries() {
        assert_eq!(split_selector_list(" , .a,, "), vec![".a"]);
    }

    #[test]
    fn declared_names_prefer_raw_text() {
        let block = DeclarationBlock {
            declarations: vec![
                Declaration::new("margin-top", "0"),
                Declaration::new("margin-left", "0"),
            ],
            css_text: Some("margin: 0; color: red !important;".to_string()),
        };
        assert_eq!(block.declared_names(), vec!["margin", "color"]);
    }

    #[test]
    fn declared_names_fall_back_to_declarations() {
        let block = DeclarationBlock::new(vec![Declaration::new("content", "\"x\"")]);
        assert_eq!(block.declared_names(), vec!["content"]);
    }

    #[test]
    fn pseudo_element_forms() {
        assert_eq!(PseudoElement::Before.as_str(), "::before");
        assert_eq!(PseudoElement::After.legacy_str(), ":after");
    }

    #[test]
    fn rule_tree_deserializes_from_tagged_json() {
        let json = r#"[
            {"type": "style", "selectorText": "p", "style": {"declarations": [{"property": "color", "value": "red"}]}},
            {"type": "conditional", "kind": "media", "condition": "(min-width: 1px)", "rules": []},
            {"type": "group", "rules": []},
            {"type": "other"}
        ]"#;
        let rules: Vec<CssRule> = serde_json::from_str(json).unwrap();
        assert_eq!(rules.len(), 4);
        assert!(matches!(rules[0], CssRule::Style(_)));
        assert!(matches!(
            &rules[1],
            CssRule::Conditional(c) if c.kind == ConditionKind::Media
        ));
        assert!(matches!(rules[3], CssRule::Other));
    }

    #[test]
    fn unreadable_sheet_reports_error() {
        let sheet = StyleSheet {
            href: Some("https://cdn.example/x.css".into()),
            rules: None,
            error: Some("SecurityError".into()),
        };
        assert!(matches!(sheet.css_rules(), Err(HostError::Inaccessible(msg)) if msg == "SecurityError"));
    }
}
