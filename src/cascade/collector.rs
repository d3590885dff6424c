//! Rule collection: every declaration that could set a property on an element.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::specificity::{self, INLINE_SPECIFICITY};
use crate::host::{ElementId, StyleHost};
use crate::types::{ConditionKind, ConditionalRule, CssRule, PseudoElement, StyleRule};

/// Ordinal given to inline declarations; later than any rule.
pub const INLINE_ORDINAL: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Inline,
    Rule,
}

/// An evaluated-true `@media` / `@supports` condition enclosing a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRuleCondition {
    pub kind: ConditionKind,
    pub condition: String,
}

impl fmt::Display for AtRuleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.keyword(), self.condition)
    }
}

/// One declaration of one property found for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleCandidate {
    pub property: String,
    pub origin: Origin,
    pub important: bool,
    pub selector: Option<String>,
    pub specificity: u32,
    pub conditions: Vec<AtRuleCondition>,
    pub ordinal: u64,
}

impl StyleCandidate {
    pub fn media_conditions(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .filter(|c| c.kind == ConditionKind::Media)
            .map(|c| c.condition.trim())
    }
}

/// Candidates gathered for one element, grouped by property.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    by_property: BTreeMap<String, Vec<StyleCandidate>>,
}

impl CandidateSet {
    fn add(&mut self, candidate: StyleCandidate) {
        self.by_property
            .entry(candidate.property.clone())
            .or_default()
            .push(candidate);
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.by_property.keys().map(String::as_str)
    }

    pub fn candidates(&self, property: &str) -> &[StyleCandidate] {
        self.by_property
            .get(property)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_property.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_property.is_empty()
    }
}

/// Walks the document's stylesheets on behalf of one element at a time.
pub struct RuleCollector<'h, H: StyleHost + ?Sized> {
    host: &'h H,
}

impl<'h, H: StyleHost + ?Sized> RuleCollector<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Gather inline and stylesheet candidates for `el`.
    pub fn collect(&self, el: ElementId) -> CandidateSet {
        let mut set = CandidateSet::default();

        if let Ok(declarations) = self.host.inline_style(el) {
            for decl in declarations {
                set.add(StyleCandidate {
                    property: decl.property,
                    origin: Origin::Inline,
                    important: decl.important,
                    selector: None,
                    specificity: INLINE_SPECIFICITY,
                    conditions: Vec::new(),
                    ordinal: INLINE_ORDINAL,
                });
            }
        }

        let mut ordinal = 0u64;
        for sheet in self.host.style_sheets() {
            if let Ok(rules) = sheet.css_rules() {
                self.walk(el, rules, &[], &mut ordinal, &mut set);
            }
        }

        set
    }

    fn walk(
        &self,
        el: ElementId,
        rules: &[CssRule],
        active: &[AtRuleCondition],
        ordinal: &mut u64,
        set: &mut CandidateSet,
    ) {
        for rule in rules {
            match rule {
                CssRule::Style(style) => self.add_style_rule(el, style, active, ordinal, set),
                CssRule::Conditional(cond) => {
                    if self.condition_holds(cond) {
                        let mut nested = active.to_vec();
                        nested.push(AtRuleCondition {
                            kind: cond.kind,
                            condition: cond.condition.clone(),
                        });
                        self.walk(el, &cond.rules, &nested, ordinal, set);
                    }
                }
                CssRule::Group(group) => self.walk(el, &group.rules, active, ordinal, set),
                CssRule::Other => {}
            }
        }
    }

    fn add_style_rule(
        &self,
        el: ElementId,
        rule: &StyleRule,
        active: &[AtRuleCondition],
        ordinal: &mut u64,
        set: &mut CandidateSet,
    ) {
        for selector in rule.selectors() {
            if !matches!(self.host.matches(el, selector), Ok(true)) {
                continue;
            }
            let weight = specificity::weight(selector);
            for decl in &rule.style.declarations {
                *ordinal += 1;
                set.add(StyleCandidate {
                    property: decl.property.clone(),
                    origin: Origin::Rule,
                    important: decl.important,
                    selector: Some(selector.to_string()),
                    specificity: weight,
                    conditions: active.to_vec(),
                    ordinal: *ordinal,
                });
            }
        }
    }

    /// Names of properties explicitly declared by rules targeting `el`'s
    /// `which` pseudo-element.
    pub fn pseudo_properties(&self, el: ElementId, which: PseudoElement) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for sheet in self.host.style_sheets() {
            if let Ok(rules) = sheet.css_rules() {
                self.walk_pseudo(el, which, rules, &mut names);
            }
        }
        names
    }

    fn walk_pseudo(
        &self,
        el: ElementId,
        which: PseudoElement,
        rules: &[CssRule],
        names: &mut BTreeSet<String>,
    ) {
        for rule in rules {
            match rule {
                CssRule::Style(style) => {
                    let targets_el = style.selectors().into_iter().any(|selector| {
                        if !selector.contains(which.legacy_str()) {
                            return false;
                        }
                        let base = strip_generated_content(selector);
                        !base.is_empty() && matches!(self.host.matches(el, &base), Ok(true))
                    });
                    if targets_el {
                        names.extend(style.style.declared_names());
                    }
                }
                CssRule::Conditional(cond) => {
                    if self.condition_holds(cond) {
                        self.walk_pseudo(el, which, &cond.rules, names);
                    }
                }
                CssRule::Group(group) => self.walk_pseudo(el, which, &group.rules, names),
                CssRule::Other => {}
            }
        }
    }

    /// Unevaluable conditions count as false.
    fn condition_holds(&self, rule: &ConditionalRule) -> bool {
        let result = match rule.kind {
            ConditionKind::Media => self.host.match_media(&rule.condition),
            ConditionKind::Supports => self.host.supports(&rule.condition),
        };
        result.unwrap_or(false)
    }
}

/// Remove every `::before`, `::after`, `:before` and `:after` token.
pub fn strip_generated_content(selector: &str) -> String {
    let mut out = String::with_capacity(selector.len());
    let mut rest = selector;
    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after_colon = &rest[pos + 1..];
        let name_start = after_colon.strip_prefix(':').unwrap_or(after_colon);
        let skipped = ["before", "after"]
            .iter()
            .find(|name| name_start.starts_with(*name))
            .map(|name| &name_start[name.len()..]);
        match skipped {
            Some(remaining) => rest = remaining,
            None => {
                out.push(':');
                rest = after_colon;
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_modern_and_legacy_tokens() {
        assert_eq!(strip_generated_content(".a::before"), ".a");
        assert_eq!(strip_generated_content(".a:after"), ".a");
        assert_eq!(strip_generated_content("li:hover::before"), "li:hover");
        assert_eq!(strip_generated_content("::before"), "");
        assert_eq!(strip_generated_content("a:not(.x)::after"), "a:not(.x)");
    }

    #[test]
    fn candidate_set_groups_by_property() {
        let mut set = CandidateSet::default();
        for (prop, ord) in [("color", 1), ("margin", 2), ("color", 3)] {
            set.add(StyleCandidate {
                property: prop.into(),
                origin: Origin::Rule,
                important: false,
                selector: Some("p".into()),
                specificity: 1,
                conditions: Vec::new(),
                ordinal: ord,
            });
        }
        assert_eq!(set.len(), 2);
        assert_eq!(set.candidates("color").len(), 2);
        assert!(set.candidates("padding").is_empty());
        assert_eq!(set.properties().collect::<Vec<_>>(), vec!["color", "margin"]);
    }

    #[test]
    fn condition_display_includes_keyword() {
        let cond = AtRuleCondition {
            kind: ConditionKind::Supports,
            condition: "(display: grid)".into(),
        };
        assert_eq!(cond.to_string(), "@supports (display: grid)");
    }
}
