//! Winner selection among competing declarations.

use super::collector::StyleCandidate;

/// Pick the declaration that wins the cascade for one property.
///
/// Ordering is importance, then specificity, then discovery ordinal; higher
/// wins at every step. Ordinals are unique within a collection pass, so the
/// result does not depend on the order of `candidates`.
pub fn pick_winner(candidates: &[StyleCandidate]) -> Option<&StyleCandidate> {
    candidates
        .iter()
        .max_by_key(|c| (c.important, c.specificity, c.ordinal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::collector::{Origin, INLINE_ORDINAL};
    use crate::cascade::specificity::{weight, INLINE_SPECIFICITY};

    fn rule(selector: &str, important: bool, ordinal: u64) -> StyleCandidate {
        StyleCandidate {
            property: "color".into(),
            origin: Origin::Rule,
            important,
            selector: Some(selector.into()),
            specificity: weight(selector),
            conditions: Vec::new(),
            ordinal,
        }
    }

    fn inline(important: bool) -> StyleCandidate {
        StyleCandidate {
            property: "color".into(),
            origin: Origin::Inline,
            important,
            selector: None,
            specificity: INLINE_SPECIFICITY,
            conditions: Vec::new(),
            ordinal: INLINE_ORDINAL,
        }
    }

    fn winner_selector(candidates: &[StyleCandidate]) -> Option<&str> {
        pick_winner(candidates).and_then(|c| c.selector.as_deref())
    }

    #[test]
    fn empty_input_has_no_winner() {
        assert!(pick_winner(&[]).is_none());
    }

    #[test]
    fn specificity_decides_when_importance_ties() {
        let candidates = vec![rule("#x", false, 1), rule(".y", false, 2)];
        assert_eq!(winner_selector(&candidates), Some("#x"));
    }

    #[test]
    fn importance_beats_specificity() {
        let candidates = vec![rule("#x", false, 1), rule(".y", true, 2)];
        assert_eq!(winner_selector(&candidates), Some(".y"));
    }

    #[test]
    fn later_rule_wins_a_specificity_tie() {
        let candidates = vec![rule(".a", false, 1), rule(".b", false, 2)];
        assert_eq!(winner_selector(&candidates), Some(".b"));
    }

    #[test]
    fn important_rule_beats_plain_inline() {
        let candidates = vec![inline(false), rule("p", true, 3)];
        assert_eq!(winner_selector(&candidates), Some("p"));
    }

    #[test]
    fn inline_beats_any_plain_rule_and_important_inline_beats_all() {
        let candidates = vec![rule("#a #b .c", false, 7), inline(false)];
        assert_eq!(pick_winner(&candidates).map(|c| c.origin), Some(Origin::Inline));

        let candidates = vec![rule("#a #b .c", true, 7), inline(true)];
        assert_eq!(pick_winner(&candidates).map(|c| c.origin), Some(Origin::Inline));
    }

    #[test]
    fn result_is_independent_of_input_order() {
        let base = vec![
            rule(".a", false, 1),
            rule("#b", false, 2),
            rule("div", true, 3),
            rule(".c.d", true, 4),
            inline(false),
        ];
        let expected = pick_winner(&base).cloned();
        assert_eq!(expected.as_ref().and_then(|c| c.selector.as_deref()), Some(".c.d"));

        for rotation in 0..base.len() {
            let mut shuffled = base.clone();
            shuffled.rotate_left(rotation);
            assert_eq!(pick_winner(&shuffled).cloned(), expected);
            shuffled.reverse();
            assert_eq!(pick_winner(&shuffled).cloned(), expected);
        }
    }
}
