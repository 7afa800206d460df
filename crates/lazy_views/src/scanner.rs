//! Placeholder discovery.
use std::collections::HashSet;

use core_types::CacheId;
use html::{Document, DomError, NodeId, Selector};

use crate::config::LazyViewsConfig;
use crate::host::PageHost;

/// Placeholders already handed to a batch. `claim` is the check-and-insert
/// that guarantees each placeholder is submitted at most once.
#[derive(Debug, Default)]
pub struct ClaimSet {
    claimed: HashSet<NodeId>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `node` was not claimed before.
    pub fn claim(&mut self, node: NodeId) -> bool {
        self.claimed.insert(node)
    }

    pub fn is_claimed(&self, node: NodeId) -> bool {
        self.claimed.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

#[derive(Debug)]
pub struct PlaceholderScanner {
    unprocessed: Selector,
    spinner: Selector,
    processed_class: String,
    cache_id_attribute: String,
}

impl PlaceholderScanner {
    pub fn new(config: &LazyViewsConfig) -> Result<Self, DomError> {
        Ok(Self {
            unprocessed: Selector::parse(&config.unprocessed_selector())?,
            spinner: Selector::parse(&format!(".{}", config.spinner_class))?,
            processed_class: config.processed_class.clone(),
            cache_id_attribute: config.cache_id_attribute.clone(),
        })
    }

    /// Claims every unprocessed placeholder and returns their cache ids in
    /// document order. Duplicated ids are kept.
    pub fn scan(
        &self,
        doc: &mut Document,
        claims: &mut ClaimSet,
        host: &mut dyn PageHost,
    ) -> Vec<CacheId> {
        let mut ids = Vec::new();
        for placeholder in doc.select_all(&self.unprocessed) {
            if !claims.claim(placeholder) {
                log::trace!(target: "lazy_views.scan", "{placeholder:?} already claimed");
                continue;
            }
            if let Err(err) = doc.add_class(placeholder, &self.processed_class) {
                log::warn!(target: "lazy_views.scan", "cannot mark {placeholder:?}: {err}");
            }

            for spinner in self.spinners_for(doc, placeholder) {
                host.start_spinner(doc, spinner);
            }

            match doc.attribute(placeholder, &self.cache_id_attribute) {
                Some(id) => ids.push(CacheId::from(id)),
                None => log::warn!(
                    target: "lazy_views.scan",
                    "placeholder {placeholder:?} has no {}",
                    self.cache_id_attribute
                ),
            }
        }
        log::debug!(target: "lazy_views.scan", "claimed {} placeholder(s)", ids.len());
        ids
    }

    /// Spinners inside the placeholder, or else spinners next to it.
    fn spinners_for(&self, doc: &Document, placeholder: NodeId) -> Vec<NodeId> {
        let inner = doc.select_within(placeholder, &self.spinner);
        if !inner.is_empty() {
            return inner;
        }
        let Some(parent) = doc.parent(placeholder) else {
            return Vec::new();
        };
        doc.children(parent)
            .iter()
            .copied()
            .filter(|&sibling| sibling != placeholder && self.spinner.matches(doc, sibling))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HeadlessHost;

    const PAGE: &str = r#"<body>
        <div class="lazy-views-placeholder" data-lazy-views-cache-id="a1"><span class="lazy-views-spinner"></span></div>
        <section>
          <span class="lazy-views-spinner"></span>
          <div class="lazy-views-placeholder" data-lazy-views-cache-id="a2"></div>
        </section>
        <div class="lazy-views-placeholder processed" data-lazy-views-cache-id="old"></div>
        <div class="lazy-views-placeholder" data-lazy-views-cache-id="a1"></div>
    </body>"#;

    fn scanner() -> PlaceholderScanner {
        PlaceholderScanner::new(&LazyViewsConfig::default()).unwrap()
    }

    fn ids(list: &[CacheId]) -> Vec<&str> {
        list.iter().map(CacheId::as_str).collect()
    }

    #[test]
    fn collects_unprocessed_ids_in_order() {
        let mut doc = Document::parse(PAGE);
        let mut claims = ClaimSet::new();
        let mut host = HeadlessHost::new();

        let batch = scanner().scan(&mut doc, &mut claims, &mut host);
        assert_eq!(ids(&batch), ["a1", "a2", "a1"]);
        assert_eq!(claims.len(), 3);
        assert!(doc.select(".lazy-views-placeholder:not(.processed)").unwrap().is_empty());
        assert_eq!(host.spinners().len(), 2);
    }

    #[test]
    fn second_scan_finds_nothing() {
        let mut doc = Document::parse(PAGE);
        let mut claims = ClaimSet::new();
        let mut host = HeadlessHost::new();
        let scanner = scanner();

        assert_eq!(scanner.scan(&mut doc, &mut claims, &mut host).len(), 3);
        assert!(scanner.scan(&mut doc, &mut claims, &mut host).is_empty());
    }

    #[test]
    fn claim_holds_even_if_marker_is_stripped() {
        let mut doc = Document::parse(PAGE);
        let mut claims = ClaimSet::new();
        let mut host = HeadlessHost::new();
        let scanner = scanner();
        scanner.scan(&mut doc, &mut claims, &mut host);

        for node in doc.select(".lazy-views-placeholder").unwrap() {
            doc.remove_class(node, "processed").unwrap();
        }
        assert!(scanner.scan(&mut doc, &mut claims, &mut host).is_empty());
    }

    #[test]
    fn placeholder_without_id_is_claimed_but_not_batched() {
        let mut doc = Document::parse(r#"<div class="lazy-views-placeholder"></div>"#);
        let mut claims = ClaimSet::new();
        let batch = scanner().scan(&mut doc, &mut claims, &mut HeadlessHost::new());
        assert!(batch.is_empty());
        assert_eq!(claims.len(), 1);
        assert_eq!(
            doc.to_html(),
            r#"<div class="lazy-views-placeholder processed"></div>"#
        );
    }
}
