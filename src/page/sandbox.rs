use std::cell::Cell;
use std::collections::BTreeMap;

use crate::host::{BaselineSandbox, HostError, HostResult};
use crate::types::{PropertyMap, PseudoElement};

/// Replays the UA baseline probes recorded at capture time.
pub struct PageSandbox<'a> {
    recorded: &'a BTreeMap<String, PropertyMap>,
    live: &'a Cell<usize>,
}

impl<'a> PageSandbox<'a> {
    pub(super) fn open(recorded: &'a BTreeMap<String, PropertyMap>, live: &'a Cell<usize>) -> Self {
        live.set(live.get() + 1);
        Self { recorded, live }
    }
}

/// Key under which a probe is recorded: `tag` or `tag|::before`.
pub fn baseline_key(tag: &str, pseudo: Option<PseudoElement>) -> String {
    match pseudo {
        Some(which) => format!("{}|{}", tag, which),
        None => tag.to_string(),
    }
}

impl BaselineSandbox for PageSandbox<'_> {
    fn probe(&mut self, tag: &str, pseudo: Option<PseudoElement>) -> HostResult<PropertyMap> {
        let key = baseline_key(tag, pseudo);
        self.recorded
            .get(&key)
            .cloned()
            .ok_or_else(|| HostError::Unavailable(format!("no baseline recorded for '{}'", key)))
    }
}

impl Drop for PageSandbox<'_> {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}
