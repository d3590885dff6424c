//! Selector specificity estimation.
//!
//! Specificity is collapsed into one comparable integer instead of the
//! standard (a, b, c) tuple. The estimate is a heuristic: `:is()` and
//! `:where()` contribute their whole argument, and other functional
//! pseudo-classes count once plus any ids/classes/attributes they contain.

/// Weight given to inline declarations; above any selector weight.
pub const INLINE_SPECIFICITY: u32 = 1_000_000;

const ID_WEIGHT: u32 = 1_000;
const CLASS_WEIGHT: u32 = 10;
const TYPE_WEIGHT: u32 = 1;

const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counts {
    ids: u32,
    classes: u32,
    attributes: u32,
    pseudo_classes: u32,
    types: u32,
    pseudo_elements: u32,
}

impl Counts {
    fn weight(&self) -> u32 {
        let mid = self.classes + self.attributes + self.pseudo_classes;
        let low = self.types + self.pseudo_elements;
        self.ids
            .saturating_mul(ID_WEIGHT)
            .saturating_add(mid.saturating_mul(CLASS_WEIGHT))
            .saturating_add(low.saturating_mul(TYPE_WEIGHT))
    }
}

/// Estimate the specificity weight of a single selector.
///
/// `1000 × ids + 10 × (classes + attributes + pseudo-classes) + (types + pseudo-elements)`.
pub fn weight(selector: &str) -> u32 {
    let cleaned = strip_strings_and_comments(selector);
    let chars: Vec<char> = cleaned.chars().collect();
    let mut counts = Counts::default();
    scan(&chars, &mut counts, false);
    counts.weight()
}

/// Count the parts of `input`. Inside functional pseudo-class arguments
/// (`nested`) only ids, classes and attribute selectors are counted.
fn scan(input: &[char], counts: &mut Counts, nested: bool) {
    let mut i = 0;
    while i < input.len() {
        match input[i] {
            '\\' => i += 2,
            '#' => {
                let (ident, next) = read_ident(input, i + 1);
                if !ident.is_empty() {
                    counts.ids += 1;
                }
                i = next;
            }
            '.' => {
                let (ident, next) = read_ident(input, i + 1);
                if !ident.is_empty() {
                    counts.classes += 1;
                }
                i = next;
            }
            '[' => {
                let end = find_closing(input, i, '[', ']');
                if end > i + 1 {
                    counts.attributes += 1;
                }
                i = end + 1;
            }
            ':' if input.get(i + 1) == Some(&':') => {
                let (ident, mut next) = read_ident(input, i + 2);
                if !ident.is_empty() && !nested {
                    counts.pseudo_elements += 1;
                }
                if input.get(next) == Some(&'(') {
                    next = find_closing(input, next, '(', ')') + 1;
                }
                i = next;
            }
            ':' => {
                let (ident, next) = read_ident(input, i + 1);
                i = next;
                if ident.is_empty() {
                    continue;
                }
                let name = ident.to_ascii_lowercase();
                if input.get(next) == Some(&'(') {
                    let close = find_closing(input, next, '(', ')');
                    let arg = &input[(next + 1).min(close)..close];
                    if name == "is" || name == "where" {
                        scan(arg, counts, nested);
                    } else {
                        if !nested {
                            counts.pseudo_classes += 1;
                        }
                        scan(arg, counts, true);
                    }
                    i = close + 1;
                } else if nested {
                    continue;
                } else if LEGACY_PSEUDO_ELEMENTS.contains(&name.as_str()) {
                    counts.pseudo_elements += 1;
                } else {
                    counts.pseudo_classes += 1;
                }
            }
            c if c.is_ascii_alphabetic() => {
                let (_, next) = read_ident(input, i);
                if !nested {
                    counts.types += 1;
                }
                i = next;
            }
            c if is_ident_char(c) => {
                let (_, next) = read_ident(input, i);
                i = next;
            }
            _ => i += 1,
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

fn read_ident(input: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < input.len() && is_ident_char(input[end]) {
        end += 1;
    }
    let ident = input[start.min(end)..end].iter().collect();
    (ident, end)
}

/// Index of the bracket closing the one at `open_at`, or the input length
/// when unbalanced.
fn find_closing(input: &[char], open_at: usize, open: char, close: char) -> usize {
    let mut depth = 0usize;
    let mut i = open_at;
    while i < input.len() {
        let c = input[i];
        if c == '\\' {
            i += 2;
            continue;
        }
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return i;
            }
        }
        i += 1;
    }
    input.len()
}

fn strip_strings_and_comments(selector: &str) -> String {
    let mut out = String::with_capacity(selector.len());
    let mut chars = selector.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                let quote = c;
                while let Some(inner) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == quote {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_beats_classes_beats_types() {
        assert!(weight("#a.b.c") > weight(".b.c.d.e"));
        assert!(weight(".b.c.d.e") > weight("div span"));
    }

    #[test]
    fn counts_each_category() {
        assert_eq!(weight("#a.b.c"), 1020);
        assert_eq!(weight(".b.c.d.e"), 40);
        assert_eq!(weight("div span"), 2);
        assert_eq!(weight("ul > li + li ~ li"), 4);
        assert_eq!(weight("a[href]:hover"), 21);
        assert_eq!(weight("*"), 0);
    }

    #[test]
    fn pseudo_elements_weigh_like_types() {
        assert_eq!(weight("p::before"), 2);
        assert_eq!(weight("p:after"), 2);
        assert_eq!(weight("p::first-line"), 2);
    }

    #[test]
    fn is_and_where_contribute_their_arguments() {
        assert_eq!(weight(":is(.a, #b) p"), 1011);
        assert_eq!(weight(":where(.a) div"), 11);
    }

    #[test]
    fn functional_pseudo_classes_count_once_plus_inner_selectors() {
        assert_eq!(weight("li:nth-child(2n+1)"), 11);
        assert_eq!(weight("p:not(.x)"), 21);
        assert_eq!(weight("p:not(span)"), 11);
    }

    #[test]
    fn strings_and_comments_are_ignored() {
        assert_eq!(weight("a[href=\"#top.x\"]"), 11);
        assert_eq!(weight("/* #id */ .a"), 10);
        assert_eq!(weight("[title='a b c']"), 10);
    }

    #[test]
    fn never_panics_on_malformed_input() {
        assert_eq!(weight(""), 0);
        assert_eq!(weight(":is(.a"), 10);
        assert_eq!(weight("[data-x"), 10);
        assert_eq!(weight("#"), 0);
        assert_eq!(weight("\"unterminated"), 0);
        assert_eq!(weight("a\\"), 1);
    }

    #[test]
    fn inline_weight_exceeds_plausible_selectors() {
        assert!(INLINE_SPECIFICITY > weight("#a #b #c #d .e .f .g div span"));
    }
}
