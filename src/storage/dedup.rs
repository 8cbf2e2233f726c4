use crate::storage::{LogEntry, StorageResult};
use std::collections::HashSet;

/// In-memory set of product identifiers already recorded
///
/// Built once per run from the result log and only grown afterwards.
#[derive(Debug, Clone, Default)]
pub struct DedupStore {
    known: HashSet<String>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the set from replayed log entries
    ///
    /// Every info entry carrying a non-empty product id is inserted; other
    /// entries are ignored. A read error fails the whole rebuild.
    pub fn rehydrate<I>(entries: I) -> StorageResult<Self>
    where
        I: IntoIterator<Item = StorageResult<LogEntry>>,
    {
        let mut store = Self::new();
        for entry in entries {
            if let Some(id) = entry?.listing_id() {
                store.known.insert(id.to_string());
            }
        }
        Ok(store)
    }

    pub fn has(&self, product_id: &str) -> bool {
        self.known.contains(product_id)
    }

    /// Inserts the id, returning true only if it was not known yet
    pub fn try_insert(&mut self, product_id: &str) -> bool {
        if self.known.contains(product_id) {
            return false;
        }
        self.known.insert(product_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
