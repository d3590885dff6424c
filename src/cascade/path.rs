//! Human-readable element paths.

use crate::host::{ElementId, StyleHost};

/// Build a selector-like path for `el`.
///
/// Elements with an id are addressed by it directly. Otherwise one segment
/// per ancestor (stopping below the document element) of the form
/// `tag.class1.class2:nth-of-type(n)`, joined with ` > `; the
/// `:nth-of-type` suffix only appears when same-tag siblings exist.
pub fn css_path<H: StyleHost + ?Sized>(host: &H, el: ElementId) -> String {
    if let Some(id) = host.id(el).filter(|id| !id.is_empty()) {
        return format!("#{}", css_escape(id));
    }

    let root = host.document_element();
    let mut segments = Vec::new();
    let mut current = Some(el);

    while let Some(node) = current {
        if Some(node) == root || !host.is_element(node) {
            break;
        }
        segments.push(segment(host, node));
        current = host.parent_element(node);
    }

    segments.reverse();
    segments.join(" > ")
}

fn segment<H: StyleHost + ?Sized>(host: &H, el: ElementId) -> String {
    let tag = host.tag_name(el);
    let mut out = tag.to_ascii_lowercase();

    for class in host.class_list(el) {
        out.push('.');
        out.push_str(&css_escape(class));
    }

    if let Some(parent) = host.parent_element(el) {
        let same_tag: Vec<ElementId> = host
            .element_children(parent)
            .into_iter()
            .filter(|&sibling| host.tag_name(sibling) == tag)
            .collect();
        if same_tag.len() > 1 {
            if let Some(pos) = same_tag.iter().position(|&sibling| sibling == el) {
                out.push_str(&format!(":nth-of-type({})", pos + 1));
            }
        }
    }

    out
}

/// Escape an identifier the way `CSS.escape` does.
pub fn css_escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());

    if chars.len() == 1 && chars[0] == '-' {
        return "\\-".to_string();
    }

    for (index, &ch) in chars.iter().enumerate() {
        let leading_digit =
            ch.is_ascii_digit() && (index == 0 || (index == 1 && chars[0] == '-'));
        match ch {
            '\0' => out.push('\u{fffd}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&format!("\\{:x} ", ch as u32)),
            _ if leading_digit => out.push_str(&format!("\\{:x} ", ch as u32)),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::test_support::{PageBuilder, BODY};

    #[test]
    fn escape_matches_cssom() {
        assert_eq!(css_escape("main"), "main");
        assert_eq!(css_escape("md:flex"), "md\\:flex");
        assert_eq!(css_escape("1col"), "\\31 col");
        assert_eq!(css_escape("-2x"), "-\\32 x");
        assert_eq!(css_escape("-"), "\\-");
        assert_eq!(css_escape("a b"), "a\\ b");
        assert_eq!(css_escape("w-1/2"), "w-1\\/2");
        assert_eq!(css_escape("café"), "café");
    }

    #[test]
    fn id_short_circuits_the_path() {
        let mut b = PageBuilder::new();
        let div = b.child(BODY, "div", &[("id", "hero:top")]);
        let page = b.build();
        assert_eq!(css_path(&page, div), "#hero\\:top");
    }

    #[test]
    fn segments_stop_below_the_document_element() {
        let mut b = PageBuilder::new();
        let list = b.child(BODY, "ul", &[("class", "nav  main")]);
        b.child(list, "li", &[]);
        let second = b.child(list, "li", &[("class", "active")]);
        let page = b.build();
        assert_eq!(
            css_path(&page, second),
            "body > ul.nav.main > li.active:nth-of-type(2)"
        );
    }

    #[test]
    fn only_children_get_no_index() {
        let mut b = PageBuilder::new();
        let section = b.child(BODY, "section", &[]);
        let p = b.child(section, "p", &[]);
        b.child(section, "span", &[]);
        let page = b.build();
        assert_eq!(css_path(&page, p), "body > section > p");
    }

    #[test]
    fn empty_id_falls_back_to_segments() {
        let mut b = PageBuilder::new();
        let div = b.child(BODY, "div", &[("id", "")]);
        let page = b.build();
        assert_eq!(css_path(&page, div), "body > div");
    }
}
