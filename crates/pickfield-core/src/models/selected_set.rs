use indexmap::IndexMap;

use super::item::SelectionItem;

/// Ordered, id-deduplicated collection of chosen items.
///
/// Iteration order is insertion order. Inserting an id that is already
/// present leaves the set untouched; removal keeps the order of survivors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedSet {
    items: IndexMap<String, SelectionItem>,
}

impl SelectedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item` unless its id is already present. Returns whether it was added.
    pub fn insert(&mut self, item: SelectionItem) -> bool {
        if self.items.contains_key(&item.id) {
            return false;
        }
        self.items.insert(item.id.clone(), item);
        true
    }

    /// Remove `id`, preserving the order of the remaining items.
    pub fn remove(&mut self, id: &str) -> Option<SelectionItem> {
        self.items.shift_remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&SelectionItem> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectionItem> {
        self.items.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl FromIterator<SelectionItem> for SelectedSet {
    fn from_iter<I: IntoIterator<Item = SelectionItem>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}
