//! Style cascade resolution.
//!
//! For each element of an extraction, the [`collector`] gathers every
//! declaration that could set a property, the [`resolver`] picks the
//! cascade winner per property, and the [`snapshot`] builder filters the
//! computed values against UA defaults from the [`baseline`] cache.
//! [`extract`](extract::extract) ties these together for one request.

pub mod baseline;
pub mod collector;
pub mod extract;
pub mod path;
pub mod resolver;
pub mod snapshot;
pub mod specificity;


pub use baseline::BaselineCache;
pub use collector::{AtRuleCondition, CandidateSet, Origin, RuleCollector, StyleCandidate};
pub use extract::{
    extract, resolve_target, ExtractError, ExtractionMode, ExtractionRequest, ExtractionResponse,
    ExtractionResult, ExtractionStats, TargetDescriptor, TargetSource,
};
pub use path::{css_escape, css_path};
pub use resolver::pick_winner;
pub use snapshot::{ElementSnapshot, MediaContext, SnapshotBuilder, WinnerMeta};
pub use specificity::weight as specificity_weight;
