//! Per-element snapshot assembly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::baseline::BaselineCache;
use super::collector::{CandidateSet, Origin, RuleCollector, StyleCandidate};
use super::extract::ExtractionMode;
use super::path::css_path;
use super::resolver::pick_winner;
use crate::host::{ElementId, HostResult, StyleHost};
use crate::types::{PropertyMap, PseudoElement};

const TEXT_PREVIEW_CHARS: usize = 160;

/// Properties worth reporting for generated content in `rules` mode.
///
/// A property passes when it equals an entry or starts with `entry-`.
pub const PSEUDO_ALLOWED_PREFIXES: &[&str] = &[
    "content",
    "display",
    "position",
    "top",
    "right",
    "bottom",
    "left",
    "inset",
    "z-index",
    "width",
    "height",
    "min-width",
    "min-height",
    "max-width",
    "max-height",
    "margin",
    "padding",
    "background",
    "color",
    "opacity",
    "box-shadow",
    "filter",
    "mix-blend-mode",
    "pointer-events",
    "transform",
    "translate",
    "scale",
    "rotate",
    "transform-origin",
    "transform-style",
    "perspective",
    "perspective-origin",
    "border",
    "outline",
    "clip",
    "clip-path",
    "mask",
    "text-shadow",
    "box-sizing",
];

pub fn is_pseudo_property_allowed(property: &str) -> bool {
    PSEUDO_ALLOWED_PREFIXES.iter().any(|prefix| {
        property == *prefix
            || property
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('-'))
    })
}

/// Everything exported for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub path: String,
    pub tag: String,
    pub id: Option<String>,
    pub class: Option<String>,
    pub text_preview: String,
    pub styles: PropertyMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<BTreeMap<String, WinnerMeta>>,
    #[serde(default)]
    pub pseudo: BTreeMap<PseudoElement, PropertyMap>,
}

/// Which declaration produced a property's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerMeta {
    pub source: Origin,
    pub is_important: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specificity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaContext>,
    /// Overriding this value from outside likely needs `!important`.
    pub requires_important: bool,
}

/// `@media` conditions active for a winning rule: a bare string when there
/// is exactly one, a list otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaContext {
    Single(String),
    Multiple(Vec<String>),
}

impl MediaContext {
    fn from_conditions<'a>(conditions: impl Iterator<Item = &'a str>) -> Option<Self> {
        let mut list: Vec<String> = conditions.map(str::to_string).collect();
        match list.len() {
            0 => None,
            1 => list.pop().map(MediaContext::Single),
            _ => Some(MediaContext::Multiple(list)),
        }
    }
}

impl WinnerMeta {
    pub fn from_winner(winner: &StyleCandidate) -> Self {
        let is_rule = winner.origin == Origin::Rule;
        Self {
            source: winner.origin,
            is_important: winner.important,
            selector: if is_rule { winner.selector.clone() } else { None },
            specificity: is_rule.then_some(winner.specificity),
            media: if is_rule {
                MediaContext::from_conditions(winner.media_conditions())
            } else {
                None
            },
            requires_important: winner.origin == Origin::Inline || winner.important,
        }
    }
}

/// Builds [`ElementSnapshot`]s for one extraction call.
///
/// Owns the call's [`BaselineCache`]; the baseline sandbox is released when
/// the builder is dropped.
pub struct SnapshotBuilder<'h, H: StyleHost + ?Sized> {
    host: &'h H,
    mode: ExtractionMode,
    pseudo: bool,
    collector: RuleCollector<'h, H>,
    baseline: BaselineCache<'h, H>,
}

impl<'h, H: StyleHost + ?Sized> SnapshotBuilder<'h, H> {
    pub fn new(host: &'h H, mode: ExtractionMode, pseudo: bool) -> Self {
        Self {
            host,
            mode,
            pseudo,
            collector: RuleCollector::new(host),
            baseline: BaselineCache::new(host),
        }
    }

    pub fn collect_node(&mut self, el: ElementId) -> HostResult<ElementSnapshot> {
        let host = self.host;
        let tag = host.tag_name(el).to_ascii_lowercase();

        let (styles, sources) = match self.mode {
            ExtractionMode::Rules => {
                let candidates = self.collector.collect(el);
                let styles = self.rule_styles(el, &tag, &candidates)?;
                let sources = winner_sources(&styles, &candidates);
                (styles, Some(sources))
            }
            ExtractionMode::All => (host.computed_style(el, None)?.visible(), None),
        };

        let pseudo = if !self.pseudo {
            BTreeMap::new()
        } else {
            match self.mode {
                ExtractionMode::Rules => self
                    .rule_pseudo_styles(el, &tag)
                    .unwrap_or_else(|_| empty_pseudo_maps()),
                ExtractionMode::All => {
                    let mut maps = BTreeMap::new();
                    for which in PseudoElement::ALL {
                        maps.insert(which, host.computed_style(el, Some(which))?.visible());
                    }
                    maps
                }
            }
        };

        Ok(ElementSnapshot {
            path: css_path(host, el),
            tag,
            id: host.id(el).filter(|v| !v.is_empty()).map(str::to_string),
            class: host
                .class_name(el)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            text_preview: text_preview(&host.text_content(el)),
            styles,
            sources,
            pseudo,
        })
    }

    /// Computed values of the candidate properties, minus UA defaults.
    fn rule_styles(
        &mut self,
        el: ElementId,
        tag: &str,
        candidates: &CandidateSet,
    ) -> HostResult<PropertyMap> {
        let computed = self.host.computed_style(el, None)?;
        let mut styles: PropertyMap = candidates
            .properties()
            .filter_map(|prop| {
                let value = computed.property_value(prop);
                (!value.is_empty()).then(|| (prop.to_string(), value.to_string()))
            })
            .collect();

        if let Ok(base) = self.baseline.baseline_for(tag) {
            styles.retain(|prop, value| base.get(prop) != Some(value));
        }
        Ok(styles)
    }

    fn rule_pseudo_styles(
        &mut self,
        el: ElementId,
        tag: &str,
    ) -> HostResult<BTreeMap<PseudoElement, PropertyMap>> {
        let mut maps = BTreeMap::new();
        for which in PseudoElement::ALL {
            let declared = self.collector.pseudo_properties(el, which);
            let computed = self.host.computed_style(el, Some(which))?;
            let mut values: PropertyMap = declared
                .into_iter()
                .filter_map(|prop| {
                    let value = computed.property_value(&prop).to_string();
                    (!value.is_empty()).then_some((prop, value))
                })
                .collect();

            if let Ok(base) = self.baseline.baseline_for_pseudo(tag, which) {
                values.retain(|prop, value| base.get(prop) != Some(value));
            }
            values.retain(|prop, _| is_pseudo_property_allowed(prop));
            maps.insert(which, values);
        }
        Ok(maps)
    }

    /// Tear down the baseline sandbox now rather than on drop.
    pub fn release(&mut self) {
        self.baseline.release();
    }
}

fn winner_sources(
    styles: &PropertyMap,
    candidates: &CandidateSet,
) -> BTreeMap<String, WinnerMeta> {
    styles
        .keys()
        .filter_map(|prop| {
            pick_winner(candidates.candidates(prop))
                .map(|winner| (prop.clone(), WinnerMeta::from_winner(winner)))
        })
        .collect()
}

fn empty_pseudo_maps() -> BTreeMap<PseudoElement, PropertyMap> {
    PseudoElement::ALL
        .into_iter()
        .map(|which| (which, PropertyMap::new()))
        .collect()
}

fn text_preview(text: &str) -> String {
    text.trim().chars().take(TEXT_PREVIEW_CHARS).collect()
}
