use std::collections::HashSet;

use cardscan_types::types::CardRecord;

/// Ordered, deduplicated set of collected cards, newest first.
///
/// Membership is keyed on the canonical card name, exact match. The name
/// index keeps membership tests O(1) over long sessions.
#[derive(Default)]
pub struct CollectionStore {
    records: Vec<CardRecord>,
    names: HashSet<String>,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front. Returns false without mutating when the name
    /// is already collected.
    pub fn insert(&mut self, record: CardRecord) -> bool {
        if !self.names.insert(record.name.clone()) {
            return false;
        }
        self.records.insert(0, record);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// All collected cards, newest first.
    pub fn all(&self) -> &[CardRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
