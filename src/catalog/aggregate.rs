//! Per-crawl deduplication
//!
//! The same product is often listed more than once in a category (different
//! vintages of the page, promotions). One crawl keeps exactly one item per
//! [`ItemKey`]: the cheapest listing, with its own URL.

use crate::catalog::{Item, ItemKey};
use std::collections::HashMap;

/// Items of one (locale, category) crawl, deduplicated by identity
#[derive(Debug, Default)]
pub struct Catalog {
    index: HashMap<ItemKey, usize>,
    items: Vec<Item>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item, keeping the cheaper listing when the identity is already held
    ///
    /// A strictly cheaper duplicate replaces the held item as a whole so price
    /// and URL always describe the same listing. Ties keep the first listing.
    ///
    /// Returns true if the catalog now holds this item.
    pub fn add(&mut self, item: Item) -> bool {
        let key = item.key();
        match self.index.get(&key) {
            Some(&slot) => {
                let held = &mut self.items[slot];
                if item.price < held.price {
                    tracing::debug!(
                        "Cheaper duplicate for {}: {:.2} replaces {:.2}",
                        key,
                        item.price,
                        held.price
                    );
                    *held = item;
                    true
                } else {
                    false
                }
            }
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(item);
                true
            }
        }
    }

    pub fn get(&self, key: &ItemKey) -> Option<&Item> {
        self.index.get(key).map(|&slot| &self.items[slot])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Consumes the catalog, yielding one item per identity in first-seen order
    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}

impl Extend<Item> for Catalog {
    fn extend<T: IntoIterator<Item = Item>>(&mut self, iter: T) {
        for item in iter {
            self.add(item);
        }
    }
}

impl FromIterator<Item> for Catalog {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        let mut catalog = Catalog::new();
        catalog.extend(iter);
        catalog
    }
}
