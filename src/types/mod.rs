//! Data types shared across the library.

mod core;
mod style;

pub use self::core::{BoundingBox, ResourceKind, Viewport};
pub use self::style::{
    split_selector_list, ComputedStyle, ConditionKind, ConditionalRule, CssRule, Declaration,
    DeclarationBlock, GroupRule, PropertyMap, PseudoElement, StyleRule, StyleSheet,
};
