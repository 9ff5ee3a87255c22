use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};

use super::item::OptionUIItem;

/// Ordered option items of one scope plus an id lookup.
///
/// The lookup is not serialized; it is considered stale whenever its size differs
/// from the item list and is rebuilt by [`OptionRegistry::refresh_lookup`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionRegistry {
    items: Vec<OptionUIItem>,
    #[serde(skip)]
    lookup: HashMap<String, usize>,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[OptionUIItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [OptionUIItem] {
        &mut self.items
    }

    pub fn lookup_len(&self) -> usize {
        self.lookup.len()
    }

    pub fn push(&mut self, item: OptionUIItem) {
        match self.lookup.entry(item.id().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(self.items.len());
            }
            Entry::Occupied(_) => warn_duplicate(item.id()),
        }
        self.items.push(item);
    }

    /// Destroys every item and empties the registry. Returns how many were destroyed.
    pub fn teardown(&mut self) -> usize {
        for item in &mut self.items {
            item.destroy();
        }
        let count = self.items.len();
        self.items.clear();
        self.lookup.clear();
        count
    }

    pub fn refresh_lookup(&mut self) {
        if self.lookup.len() == self.items.len() {
            return;
        }
        self.lookup.clear();
        for (index, item) in self.items.iter().enumerate() {
            match self.lookup.entry(item.id().to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
                Entry::Occupied(_) => warn_duplicate(item.id()),
            }
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<&OptionUIItem> {
        self.items.iter().find(|item| item.name() == name)
    }

    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut OptionUIItem> {
        self.items.iter_mut().find(|item| item.name() == name)
    }

    /// Lookup by option id. Falls back to a scan while the lookup is stale.
    pub fn find_by_id(&self, id: &str) -> Option<&OptionUIItem> {
        if self.lookup.len() == self.items.len() {
            self.lookup.get(id).and_then(|&index| self.items.get(index))
        } else {
            self.items.iter().find(|item| item.id() == id)
        }
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut OptionUIItem> {
        self.refresh_lookup();
        let index = *self.lookup.get(id)?;
        self.items.get_mut(index)
    }
}

/// Later items with the same id stay reachable by name only, and the lookup
/// stays smaller than the list.
fn warn_duplicate(id: &str) {
    log::warn!("duplicate option id {id}, only the first item is reachable by id");
}
