//! Selector matching for captured page models.
//!
//! Parsing and matching go through the `selectors` crate; this module only
//! supplies the element view and the pseudo-class vocabulary. User-action
//! pseudo-classes (`:hover`, `:focus`, ...) parse but never match, the same
//! as a static document with no pointer or focus. Pseudo-elements parse but
//! never match an element.

use cssparser::{
    BasicParseErrorKind, CowRcStr, ParseError, ParseErrorKind, Parser, ParserInput,
    SourceLocation, ToCss,
};
use selectors::attr::{
    AttrSelectorOperation, AttrSelectorOperator, CaseSensitivity, NamespaceConstraint,
};
use selectors::matching::{
    matches_selector, ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext,
    MatchingMode, NeedsSelectorFlags, QuirksMode,
};
use selectors::parser::{ParseRelative, SelectorParseErrorKind};
use selectors::{NthIndexCache, OpaqueElement};
use std::fmt;
use thiserror::Error;

use crate::host::ElementId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at column {column}")]
pub struct SelectorError {
    pub reason: String,
    pub column: u32,
}

impl SelectorError {
    fn from_parse(err: ParseError<'_, SelectorParseErrorKind<'_>>) -> Self {
        Self {
            reason: describe(&err.kind),
            column: err.location.column,
        }
    }
}

fn describe(kind: &ParseErrorKind<'_, SelectorParseErrorKind<'_>>) -> String {
    match kind {
        ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
            format!("unexpected '{}'", token.to_css_string())
        }
        ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
            "unexpected end of selector".to_string()
        }
        ParseErrorKind::Basic(other) => format!("{:?}", other),
        ParseErrorKind::Custom(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)) => {
            format!("unknown pseudo-class or pseudo-element '{}'", &**name)
        }
        ParseErrorKind::Custom(SelectorParseErrorKind::EmptySelector) => {
            "empty selector".to_string()
        }
        ParseErrorKind::Custom(SelectorParseErrorKind::DanglingCombinator) => {
            "dangling combinator".to_string()
        }
        ParseErrorKind::Custom(other) => format!("{:?}", other),
    }
}

/// Read-only view of an element tree the matcher walks.
pub trait SelectorTree {
    fn parent(&self, el: ElementId) -> Option<ElementId>;
    fn children(&self, el: ElementId) -> Vec<ElementId>;
    fn local_name(&self, el: ElementId) -> &str;
    fn attribute(&self, el: ElementId, name: &str) -> Option<&str>;
    /// Whether the element has element children or non-empty text.
    fn has_content(&self, el: ElementId) -> bool;
    /// Identity of the element that stays the same for the tree's lifetime.
    fn opaque(&self, el: ElementId) -> OpaqueElement;
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone)]
pub struct SelectorList(selectors::parser::SelectorList<PageSelectors>);

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut input = ParserInput::new(input);
        let mut parser = Parser::new(&mut input);
        selectors::parser::SelectorList::parse(&SelectorParser, &mut parser, ParseRelative::No)
            .map(SelectorList)
            .map_err(SelectorError::from_parse)
    }

    pub fn matches<T: SelectorTree>(&self, tree: &T, el: ElementId) -> bool {
        let element = ElementRef { tree, id: el };
        let mut nth_index_cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut nth_index_cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        let selectors::parser::SelectorList(list) = &self.0;
        list.iter()
            .any(|selector| matches_selector(selector, 0, None, &element, &mut context))
    }
}

/// Element handle handed to the `selectors` matcher.
struct ElementRef<'a, T> {
    tree: &'a T,
    id: ElementId,
}

impl<T> Clone for ElementRef<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            id: self.id,
        }
    }
}

impl<T> fmt::Debug for ElementRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<'a, T: SelectorTree> ElementRef<'a, T> {
    fn at(&self, id: ElementId) -> Self {
        Self {
            tree: self.tree,
            id,
        }
    }

    fn tag(&self) -> &'a str {
        self.tree.local_name(self.id)
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.tree.attribute(self.id, name)
    }

    fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    fn siblings(&self) -> Vec<ElementId> {
        match self.tree.parent(self.id) {
            Some(parent) => self.tree.children(parent),
            None => vec![self.id],
        }
    }

    fn is_form_control(&self) -> bool {
        matches!(
            self.tag(),
            "button" | "input" | "select" | "textarea" | "optgroup" | "option" | "fieldset"
        )
    }

    fn is_checked(&self) -> bool {
        match self.tag() {
            "input" => {
                self.has_attr("checked")
                    && self.attr("type").is_some_and(|t| {
                        t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio")
                    })
            }
            "option" => self.has_attr("selected"),
            _ => false,
        }
    }

    fn is_requirable(&self) -> bool {
        matches!(self.tag(), "input" | "select" | "textarea")
    }

    fn is_read_write(&self) -> bool {
        let editable = self
            .attr("contenteditable")
            .is_some_and(|v| !v.eq_ignore_ascii_case("false"));
        let text_control = matches!(self.tag(), "input" | "textarea")
            && !self.has_attr("readonly")
            && !self.has_attr("disabled");
        editable || text_control
    }
}

impl<T: SelectorTree> selectors::Element for ElementRef<'_, T> {
    type Impl = PageSelectors;

    fn opaque(&self) -> OpaqueElement {
        self.tree.opaque(self.id)
    }

    fn parent_element(&self) -> Option<Self> {
        self.tree.parent(self.id).map(|parent| self.at(parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let siblings = self.siblings();
        let pos = siblings.iter().position(|&s| s == self.id)?;
        pos.checked_sub(1).map(|prev| self.at(siblings[prev]))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let siblings = self.siblings();
        let pos = siblings.iter().position(|&s| s == self.id)?;
        siblings.get(pos + 1).map(|&next| self.at(next))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.tree
            .children(self.id)
            .first()
            .map(|&child| self.at(child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &str) -> bool {
        self.tag().eq_ignore_ascii_case(local_name)
    }

    fn has_namespace(&self, _ns: &()) -> bool {
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.tag().eq_ignore_ascii_case(other.tag())
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&()>,
        local_name: &CssString,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        if !matches!(ns, NamespaceConstraint::Specific(()) | NamespaceConstraint::Any) {
            return false;
        }
        let Some(actual) = self.attr(&local_name.0) else {
            return false;
        };
        match operation {
            AttrSelectorOperation::Exists => true,
            AttrSelectorOperation::WithValue {
                operator,
                case_sensitivity,
                value,
            } => attr_value_matches(actual, operator, *case_sensitivity, &value.0),
        }
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match pc {
            NonTSPseudoClass::Link | NonTSPseudoClass::AnyLink => self.is_link(),
            NonTSPseudoClass::Checked => self.is_checked(),
            NonTSPseudoClass::Disabled => self.is_form_control() && self.has_attr("disabled"),
            NonTSPseudoClass::Enabled => self.is_form_control() && !self.has_attr("disabled"),
            NonTSPseudoClass::Required => self.is_requirable() && self.has_attr("required"),
            NonTSPseudoClass::Optional => self.is_requirable() && !self.has_attr("required"),
            NonTSPseudoClass::ReadWrite => self.is_read_write(),
            NonTSPseudoClass::ReadOnly => !self.is_read_write(),
            NonTSPseudoClass::Dynamic(_) | NonTSPseudoClass::Functional { .. } => false,
        }
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.tag(), "a" | "area") && self.has_attr("href")
    }

    fn is_html_slot_element(&self) -> bool {
        self.tag() == "slot"
    }

    fn has_id(&self, id: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("id")
            .is_some_and(|actual| same(case_sensitivity, actual, &id.0))
    }

    fn has_class(&self, name: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("class").is_some_and(|classes| {
            classes
                .split_whitespace()
                .any(|class| same(case_sensitivity, class, &name.0))
        })
    }

    fn imported_part(&self, _name: &CssString) -> Option<CssString> {
        None
    }

    fn is_part(&self, _name: &CssString) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        !self.tree.has_content(self.id)
    }

    fn is_root(&self) -> bool {
        self.tree.parent(self.id).is_none()
    }
}

fn same(case_sensitivity: CaseSensitivity, a: &str, b: &str) -> bool {
    match case_sensitivity {
        CaseSensitivity::CaseSensitive => a == b,
        CaseSensitivity::AsciiCaseInsensitive => a.eq_ignore_ascii_case(b),
    }
}

fn attr_value_matches(
    actual: &str,
    operator: &AttrSelectorOperator,
    case_sensitivity: CaseSensitivity,
    expected: &str,
) -> bool {
    let (actual, expected) = match case_sensitivity {
        CaseSensitivity::CaseSensitive => (actual.to_string(), expected.to_string()),
        CaseSensitivity::AsciiCaseInsensitive => {
            (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
        }
    };
    match operator {
        AttrSelectorOperator::Equal => actual == expected,
        AttrSelectorOperator::Includes => {
            !expected.is_empty() && actual.split_whitespace().any(|word| word == expected)
        }
        AttrSelectorOperator::DashMatch => {
            actual == expected || actual.starts_with(&format!("{}-", expected))
        }
        AttrSelectorOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttrSelectorOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttrSelectorOperator::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

/// Identifier and attribute-value storage for parsed selectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssString(pub String);

impl From<&str> for CssString {
    fn from(s: &str) -> Self {
        CssString(s.to_string())
    }
}

impl std::borrow::Borrow<str> for CssString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssString {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        cssparser::serialize_string(&self.0, dest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSelectors;

impl selectors::SelectorImpl for PageSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssString;
    type Identifier = CssString;
    type LocalName = CssString;
    type NamespacePrefix = CssString;
    type NamespaceUrl = ();
    type BorrowedLocalName = str;
    type BorrowedNamespaceUrl = ();
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// Interaction and document states a static snapshot never has.
const DYNAMIC_PSEUDO_CLASSES: &[&str] = &[
    "hover",
    "active",
    "focus",
    "focus-visible",
    "focus-within",
    "visited",
    "target",
    "target-within",
    "autofill",
    "-webkit-autofill",
    "indeterminate",
    "default",
    "valid",
    "invalid",
    "user-valid",
    "user-invalid",
    "in-range",
    "out-of-range",
    "placeholder-shown",
    "fullscreen",
    "modal",
    "popover-open",
    "playing",
    "paused",
    "defined",
    "host",
    "-moz-focusring",
];

const FUNCTIONAL_PSEUDO_CLASSES: &[&str] = &["lang", "dir", "has", "host", "host-context", "state"];

const USER_ACTION_STATES: &[&str] = &["hover", "active", "focus", "focus-visible", "focus-within"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonTSPseudoClass {
    Link,
    AnyLink,
    Checked,
    Disabled,
    Enabled,
    Required,
    Optional,
    ReadWrite,
    ReadOnly,
    Dynamic(String),
    /// Functional pseudo-class that takes part in parsing but never matches.
    Functional { name: String, arguments: String },
}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = PageSelectors;

    fn is_active_or_hover(&self) -> bool {
        matches!(self, NonTSPseudoClass::Dynamic(name) if name == "hover" || name == "active")
    }

    fn is_user_action_state(&self) -> bool {
        matches!(self, NonTSPseudoClass::Dynamic(name) if USER_ACTION_STATES.contains(&name.as_str()))
    }
}

impl ToCss for NonTSPseudoClass {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let name = match self {
            NonTSPseudoClass::Link => "link",
            NonTSPseudoClass::AnyLink => "any-link",
            NonTSPseudoClass::Checked => "checked",
            NonTSPseudoClass::Disabled => "disabled",
            NonTSPseudoClass::Enabled => "enabled",
            NonTSPseudoClass::Required => "required",
            NonTSPseudoClass::Optional => "optional",
            NonTSPseudoClass::ReadWrite => "read-write",
            NonTSPseudoClass::ReadOnly => "read-only",
            NonTSPseudoClass::Dynamic(name) => name,
            NonTSPseudoClass::Functional { name, arguments } => {
                return write!(dest, ":{}({})", name, arguments);
            }
        };
        write!(dest, ":{}", name)
    }
}

/// Any pseudo-element; none of them is an element of the page model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoElement(String);

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = PageSelectors;
}

impl ToCss for PseudoElement {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        write!(dest, "::{}", self.0)
    }
}

struct SelectorParser;

impl<'i> selectors::parser::Parser<'i> for SelectorParser {
    type Impl = PageSelectors;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_is_and_where(&self) -> bool {
        true
    }

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<NonTSPseudoClass, ParseError<'i, SelectorParseErrorKind<'i>>> {
        let lower = name.to_ascii_lowercase();
        let pc = match lower.as_str() {
            "link" => NonTSPseudoClass::Link,
            "any-link" => NonTSPseudoClass::AnyLink,
            "checked" => NonTSPseudoClass::Checked,
            "disabled" => NonTSPseudoClass::Disabled,
            "enabled" => NonTSPseudoClass::Enabled,
            "required" => NonTSPseudoClass::Required,
            "optional" => NonTSPseudoClass::Optional,
            "read-write" => NonTSPseudoClass::ReadWrite,
            "read-only" => NonTSPseudoClass::ReadOnly,
            other if DYNAMIC_PSEUDO_CLASSES.contains(&other) => {
                NonTSPseudoClass::Dynamic(other.to_string())
            }
            _ => {
                return Err(location.new_custom_error(
                    SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name),
                ))
            }
        };
        Ok(pc)
    }

    fn parse_non_ts_functional_pseudo_class<'t>(
        &self,
        name: CowRcStr<'i>,
        parser: &mut Parser<'i, 't>,
    ) -> Result<NonTSPseudoClass, ParseError<'i, SelectorParseErrorKind<'i>>> {
        let lower = name.to_ascii_lowercase();
        if !FUNCTIONAL_PSEUDO_CLASSES.contains(&lower.as_str()) {
            return Err(parser.new_custom_error(
                SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name),
            ));
        }
        let start = parser.position();
        while parser.next().is_ok() {}
        Ok(NonTSPseudoClass::Functional {
            name: lower,
            arguments: parser.slice_from(start).trim().to_string(),
        })
    }

    fn parse_pseudo_element(
        &self,
        _location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<PseudoElement, ParseError<'i, SelectorParseErrorKind<'i>>> {
        Ok(PseudoElement(name.to_ascii_lowercase()))
    }

    fn default_namespace(&self) -> Option<()> {
        None
    }

    fn namespace_for_prefix(&self, _prefix: &CssString) -> Option<()> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// html > body > (div#main.box[data-role=hero] > (p.a, p.b, span), ul > li*3)
    struct Tree {
        tags: Vec<&'static str>,
        parents: Vec<Option<usize>>,
        attrs: Vec<HashMap<&'static str, &'static str>>,
    }

    impl Tree {
        fn sample() -> Self {
            let spec: Vec<(&str, Option<usize>, Vec<(&str, &str)>)> = vec![
                ("html", None, vec![]),
                ("body", Some(0), vec![]),
                (
                    "div",
                    Some(1),
                    vec![("id", "main"), ("class", "box wide"), ("data-role", "hero-banner")],
                ),
                ("p", Some(2), vec![("class", "a")]),
                ("p", Some(2), vec![("class", "b")]),
                ("span", Some(2), vec![]),
                ("ul", Some(1), vec![]),
                ("li", Some(6), vec![]),
                ("li", Some(6), vec![("class", "x")]),
                ("li", Some(6), vec![]),
                ("a", Some(9), vec![("href", "/home")]),
            ];
            Self {
                tags: spec.iter().map(|s| s.0).collect(),
                parents: spec.iter().map(|s| s.1).collect(),
                attrs: spec.into_iter().map(|s| s.2.into_iter().collect()).collect(),
            }
        }

        fn check(&self, selector: &str, el: usize) -> bool {
            SelectorList::parse(selector)
                .unwrap_or_else(|e| panic!("{selector}: {e}"))
                .matches(self, ElementId(el))
        }
    }

    impl SelectorTree for Tree {
        fn parent(&self, el: ElementId) -> Option<ElementId> {
            self.parents[el.0].map(ElementId)
        }
        fn children(&self, el: ElementId) -> Vec<ElementId> {
            (0..self.tags.len())
                .filter(|&i| self.parents[i] == Some(el.0))
                .map(ElementId)
                .collect()
        }
        fn local_name(&self, el: ElementId) -> &str {
            self.tags[el.0]
        }
        fn attribute(&self, el: ElementId, name: &str) -> Option<&str> {
            self.attrs[el.0].get(name).copied()
        }
        fn has_content(&self, el: ElementId) -> bool {
            !self.children(el).is_empty()
        }
        fn opaque(&self, el: ElementId) -> OpaqueElement {
            OpaqueElement::new(&self.tags[el.0])
        }
    }

    #[test]
    fn simple_selectors() {
        let tree = Tree::sample();
        assert!(tree.check("div", 2));
        assert!(tree.check("DIV", 2));
        assert!(tree.check("#main", 2));
        assert!(tree.check(".box.wide", 2));
        assert!(!tree.check(".box.narrow", 2));
        assert!(tree.check("*", 5));
        assert!(tree.check("div#main.box", 2));
    }

    #[test]
    fn attribute_operators() {
        let tree = Tree::sample();
        assert!(tree.check("[data-role]", 2));
        assert!(tree.check("[data-role^=hero]", 2));
        assert!(tree.check("[data-role$=\"banner\"]", 2));
        assert!(tree.check("[data-role*='o-b']", 2));
        assert!(tree.check("[data-role|=hero]", 2));
        assert!(tree.check("[class~=wide]", 2));
        assert!(!tree.check("[class~=wid]", 2));
        assert!(tree.check("[data-role=HERO-BANNER i]", 2));
        assert!(!tree.check("[data-role=HERO-BANNER]", 2));
    }

    #[test]
    fn combinators() {
        let tree = Tree::sample();
        assert!(tree.check("body p", 3));
        assert!(tree.check("html > body > div > p", 3));
        assert!(!tree.check("body > p", 3));
        assert!(tree.check("p + p", 4));
        assert!(!tree.check("p + span + p", 4));
        assert!(tree.check("p ~ span", 5));
        assert!(tree.check(".a ~ span", 5));
        assert!(!tree.check("span ~ p", 3));
        assert!(tree.check("ul li:last-child a", 10));
    }

    #[test]
    fn structural_pseudo_classes() {
        let tree = Tree::sample();
        assert!(tree.check("html:root", 0));
        assert!(!tree.check(":root", 1));
        assert!(tree.check("p:first-child", 3));
        assert!(tree.check("p:first-of-type", 3));
        assert!(tree.check("p:last-of-type", 4));
        assert!(tree.check("span:only-of-type", 5));
        assert!(tree.check("li:nth-child(2)", 8));
        assert!(tree.check("li:nth-child(odd)", 7));
        assert!(tree.check("li:nth-child(2n+1)", 9));
        assert!(!tree.check("li:nth-child(even)", 9));
        assert!(tree.check("li:nth-last-child(1)", 9));
        assert!(tree.check("li:nth-child(-n+2)", 8));
        assert!(!tree.check("li:nth-child(-n+2)", 9));
        assert!(tree.check("li:empty", 7));
        assert!(!tree.check("li:empty", 9));
        assert!(tree.check("a:link", 10));
    }

    #[test]
    fn extreme_nth_offsets_match_nothing() {
        let tree = Tree::sample();
        for el in 7..=9 {
            assert!(!tree.check("li:nth-child(2n-2147483648)", el));
            assert!(!tree.check("li:nth-last-child(2n-2147483648)", el));
            assert!(!tree.check("li:nth-of-type(-2147483648)", el));
        }
    }

    #[test]
    fn logical_pseudo_classes() {
        let tree = Tree::sample();
        assert!(tree.check("p:not(.b)", 3));
        assert!(!tree.check("p:not(.a, .b)", 4));
        assert!(tree.check(":is(ul, div) > :where(li, p)", 3));
        assert!(tree.check("li:not(:first-child):not(:last-child)", 8));
    }

    #[test]
    fn form_state_pseudo_classes_follow_attributes() {
        let mut tree = Tree::sample();
        tree.tags[5] = "input";
        tree.attrs[5].insert("type", "checkbox");
        tree.attrs[5].insert("checked", "");
        tree.attrs[5].insert("disabled", "");
        assert!(tree.check("input:checked", 5));
        assert!(tree.check("input:disabled", 5));
        assert!(!tree.check("input:enabled", 5));
        assert!(tree.check("input:optional", 5));
        assert!(tree.check("input:read-only", 5));
        assert!(!tree.check("p:disabled", 3));
    }

    #[test]
    fn dynamic_states_and_pseudo_elements_never_match() {
        let tree = Tree::sample();
        assert!(!tree.check("a:hover", 10));
        assert!(!tree.check("div:focus-within", 2));
        assert!(!tree.check("p::before", 3));
        assert!(!tree.check("p:after", 3));
        assert!(!tree.check("div:has(p)", 2));
        assert!(!tree.check("p:lang(en)", 3));
        assert!(tree.check("p::before, p.a", 3));
    }

    #[test]
    fn escapes_in_identifiers() {
        let mut tree = Tree::sample();
        tree.attrs[5].insert("class", "md:flex 1col");
        assert!(tree.check(".md\\:flex", 5));
        assert!(tree.check(".\\31 col", 5));
    }

    #[test]
    fn invalid_selectors_are_rejected() {
        for bad in ["", "  ", "p >", ">> p", ".", "#", "[=x]", "p:bogus", "a,,b", "li:nth-child(x)", "p)"] {
            assert!(SelectorList::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn parse_errors_name_the_problem() {
        let err = SelectorList::parse("p:bogus").unwrap_err();
        assert!(err.reason.contains("bogus"), "{err}");
        assert!(err.to_string().contains("at column"));
    }
}
