use std::collections::HashSet;

use feed_logging::{feed_debug, feed_warn};

use crate::{Keyed, Page};

/// Ordered, duplicate-free local view built from server pages.
///
/// Order is the server order in which items were first seen. Nothing outside
/// this type mutates the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator<T> {
    items: Vec<T>,
    has_more: bool,
    total: Option<u64>,
}

impl<T> Default for Accumulator<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            total: None,
        }
    }
}

impl<T: Keyed + Clone> Accumulator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `has_more` of the most recently merged page.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Server total from the last merged page, adjusted by optimistic deletes.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Merges one page.
    ///
    /// Page 1 or an explicit reset replaces everything, even with an empty page.
    /// Any other page appends only the items not yet present, in page order.
    pub fn merge_page(&mut self, page: Page<T>, is_reset: bool) -> &[T] {
        let page_number = page.page_number;
        let first = page.is_first();
        let incoming = dedupe_within_page(page.items, page_number);
        self.has_more = page.has_more;
        self.total = Some(page.total);

        if is_reset || first {
            feed_debug!(
                "Reset merge from page {}: {} -> {} items",
                page_number,
                self.items.len(),
                incoming.len()
            );
            self.items = incoming;
            return &self.items;
        }

        let known: HashSet<String> = self.items.iter().map(|i| i.key().to_string()).collect();
        let before = self.items.len();
        self.items
            .extend(incoming.into_iter().filter(|item| !known.contains(item.key())));
        feed_debug!(
            "Appended page {}: {} new items ({} total)",
            page_number,
            self.items.len() - before,
            self.items.len()
        );
        &self.items
    }

    /// Optimistic local excision. Removing an absent key is a no-op.
    pub fn remove_locally(&mut self, key: &str) -> &[T] {
        let before = self.items.len();
        self.items.retain(|item| item.key() != key);
        if self.items.len() < before {
            self.total = self.total.map(|total| total.saturating_sub(1));
        }
        &self.items
    }

    /// Replaces an existing item in place with a fresher copy.
    ///
    /// Returns `false` when the item is no longer part of the view; it is not inserted.
    pub fn replace(&mut self, item: T) -> bool {
        match self.items.iter_mut().find(|existing| existing.key() == item.key()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }
}

fn dedupe_within_page<T: Keyed>(items: Vec<T>, page_number: u32) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.key().to_string()) {
            kept.push(item);
        } else {
            // First occurrence wins; the server should never send this.
            feed_warn!(
                "Anomalous payload: duplicate id {} within page {}",
                item.key(),
                page_number
            );
        }
    }
    kept
}
