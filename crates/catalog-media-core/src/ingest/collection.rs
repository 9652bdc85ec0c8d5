//! Versioned, copy-on-write list of items.
//!
//! Every mutation builds a new item list and bumps the version, so readers
//! holding an older snapshot keep a consistent view and can detect change by
//! comparing versions.

use std::sync::Arc;

use super::{Item, ItemId};

#[derive(Debug, Clone, Default)]
pub struct ItemCollection {
    version: u64,
    items: Arc<[Item]>,
}

impl ItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incremented on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// The current item list. Later mutations do not affect it.
    pub fn snapshot(&self) -> Arc<[Item]> {
        Arc::clone(&self.items)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn main(&self) -> Option<&Item> {
        self.items.iter().find(|item| item.is_main)
    }

    /// Live display handles, in insertion order.
    pub fn handles(&self) -> Vec<String> {
        self.items.iter().filter_map(|item| item.handle.clone()).collect()
    }

    pub(crate) fn extend(&mut self, new_items: Vec<Item>) {
        let mut items = self.items.to_vec();
        items.extend(new_items);
        self.replace(items);
    }

    /// Apply `f` to a copy of the item and publish it. Returns false if the
    /// item does not exist.
    pub(crate) fn update(&mut self, id: ItemId, f: impl FnOnce(&mut Item)) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let mut items = self.items.to_vec();
        f(&mut items[pos]);
        self.replace(items);
        true
    }

    pub(crate) fn remove(&mut self, id: ItemId) -> Option<Item> {
        let pos = self.position(id)?;
        let mut items = self.items.to_vec();
        let removed = items.remove(pos);
        self.replace(items);
        Some(removed)
    }

    /// Make `id` the only main item. Returns false if it does not exist.
    pub(crate) fn set_main(&mut self, id: ItemId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let items = self
            .items
            .iter()
            .cloned()
            .map(|mut item| {
                item.is_main = item.id == id;
                item
            })
            .collect();
        self.replace(items);
        true
    }

    fn replace(&mut self, mut items: Vec<Item>) {
        normalize_main(&mut items);
        self.items = items.into();
        self.version += 1;
    }
}

impl<'a> IntoIterator for &'a ItemCollection {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Exactly one main item whenever the list is non-empty: keep the first
/// flagged item, or promote the first item if none is flagged.
fn normalize_main(items: &mut [Item]) {
    let mut seen = false;
    for item in items.iter_mut() {
        if item.is_main {
            if seen {
                item.is_main = false;
            }
            seen = true;
        }
    }
    if !seen {
        if let Some(first) = items.first_mut() {
            first.is_main = true;
        }
    }
}
