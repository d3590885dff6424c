//! User-agent baseline styles.
//!
//! A [`BaselineCache`] lives for exactly one extraction call. The first
//! lookup asks the host for an isolated sandbox which is then reused for
//! every tag; dropping the cache (or calling [`BaselineCache::release`])
//! tears the sandbox down.

use std::collections::HashMap;

use crate::host::{BaselineSandbox, HostResult, StyleHost};
use crate::types::{PropertyMap, PseudoElement};

pub struct BaselineCache<'h, H: StyleHost + ?Sized> {
    host: &'h H,
    sandbox: Option<Box<dyn BaselineSandbox + 'h>>,
    by_tag: HashMap<String, PropertyMap>,
    by_pseudo: HashMap<String, PropertyMap>,
}

impl<'h, H: StyleHost + ?Sized> BaselineCache<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self {
            host,
            sandbox: None,
            by_tag: HashMap::new(),
            by_pseudo: HashMap::new(),
        }
    }

    /// UA default computed style of a bare `tag` element.
    pub fn baseline_for(&mut self, tag: &str) -> HostResult<&PropertyMap> {
        let key = normalize_tag(tag);
        if !self.by_tag.contains_key(&key) {
            let probed = self.sandbox()?.probe(&key, None)?;
            self.by_tag.insert(key.clone(), probed);
        }
        Ok(&self.by_tag[&key])
    }

    /// UA default computed style of `tag`'s `which` pseudo-element.
    pub fn baseline_for_pseudo(
        &mut self,
        tag: &str,
        which: PseudoElement,
    ) -> HostResult<&PropertyMap> {
        let tag = normalize_tag(tag);
        let key = format!("{}|{}", tag, which);
        if !self.by_pseudo.contains_key(&key) {
            let probed = self.sandbox()?.probe(&tag, Some(which))?;
            self.by_pseudo.insert(key.clone(), probed);
        }
        Ok(&self.by_pseudo[&key])
    }

    /// Whether a sandbox is currently held.
    pub fn is_active(&self) -> bool {
        self.sandbox.is_some()
    }

    /// Tear down the sandbox. Cached entries stay readable.
    pub fn release(&mut self) {
        self.sandbox = None;
    }

    fn sandbox(&mut self) -> HostResult<&mut (dyn BaselineSandbox + 'h)> {
        let sandbox = match self.sandbox.take() {
            Some(sandbox) => sandbox,
            None => self.host.create_sandbox()?,
        };
        Ok(self.sandbox.insert(sandbox).as_mut())
    }
}

impl<H: StyleHost + ?Sized> Drop for BaselineCache<'_, H> {
    fn drop(&mut self) {
        self.release();
    }
}

fn normalize_tag(tag: &str) -> String {
    let tag = tag.trim();
    if tag.is_empty() {
        "div".to_string()
    } else {
        tag.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::test_support::PageBuilder;

    #[test]
    fn sandbox_is_created_lazily_and_shared() {
        let page = PageBuilder::new()
            .baseline("div", &[("display", "block")])
            .baseline("span", &[("display", "inline")])
            .build();
        let mut cache = BaselineCache::new(&page);
        assert_eq!(page.sandboxes_created(), 0);

        assert_eq!(cache.baseline_for("DIV").unwrap()["display"], "block");
        assert_eq!(cache.baseline_for("span").unwrap()["display"], "inline");
        assert_eq!(cache.baseline_for("div").unwrap()["display"], "block");

        assert_eq!(page.sandboxes_created(), 1);
        assert_eq!(page.live_sandboxes(), 1);
        drop(cache);
        assert_eq!(page.live_sandboxes(), 0);
    }

    #[test]
    fn pseudo_baselines_are_keyed_separately() {
        let page = PageBuilder::new()
            .baseline("p", &[("display", "block")])
            .baseline("p|::before", &[("display", "inline")])
            .build();
        let mut cache = BaselineCache::new(&page);

        let pseudo = cache
            .baseline_for_pseudo("p", PseudoElement::Before)
            .unwrap()
            .clone();
        assert_eq!(pseudo["display"], "inline");
        assert_eq!(cache.baseline_for("p").unwrap()["display"], "block");
    }

    #[test]
    fn release_tears_down_once() {
        let page = PageBuilder::new().baseline("div", &[]).build();
        let mut cache = BaselineCache::new(&page);
        cache.baseline_for("div").unwrap();
        assert!(cache.is_active());

        cache.release();
        assert!(!cache.is_active());
        assert_eq!(page.live_sandboxes(), 0);
        assert!(cache.baseline_for("div").is_ok());
        assert_eq!(page.sandboxes_created(), 1);
    }

    #[test]
    fn missing_probe_is_an_error() {
        let page = PageBuilder::new().build();
        let mut cache = BaselineCache::new(&page);
        assert!(cache.baseline_for("article").is_err());
    }
}
