//! Read-only, shareable snapshot of one dataset.

use std::sync::Arc;

use crate::models::{Dataset, Record};
use crate::search::matcher::{self, MatchResult, Suggestion};
use crate::utils::normalize;

/// One Record with its precomputed match keys.
#[derive(Debug)]
pub(crate) struct Entry {
    pub key: String,
    pub record: Record,
    /// Normalized dataset key
    pub norm_id: String,
    /// Normalized display name
    pub norm_name: String,
}

/// Immutable snapshot of a dataset, cheap to clone and share across threads.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    entries: Arc<[Entry]>,
}

impl RecordStore {
    pub fn new(dataset: Dataset) -> Self {
        let entries: Vec<Entry> = dataset
            .into_iter()
            .map(|(key, record)| Entry {
                norm_id: normalize(&key),
                norm_name: normalize(record.display_name()),
                key,
                record,
            })
            .collect();
        Self {
            entries: entries.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record stored under an exact dataset key.
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.record)
    }

    /// Records in dataset order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|e| &e.record)
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Resolve a free-text query. See [`matcher::lookup`].
    pub fn lookup(&self, query: &str) -> MatchResult<'_> {
        matcher::lookup(self, query)
    }

    /// Completion candidates for a partial query. See [`matcher::suggest`].
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<Suggestion> {
        matcher::suggest(self, prefix, limit)
    }
}

impl From<Dataset> for RecordStore {
    fn from(dataset: Dataset) -> Self {
        Self::new(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync + Clone>() {}

    #[test]
    fn test_store_is_shareable() {
        assert_send_sync::<RecordStore>();
    }

    #[test]
    fn test_snapshot_keeps_order() {
        let dataset: Dataset = ["b", "a", "c"]
            .into_iter()
            .map(|k| (k.to_string(), Record::new(k, k.to_uppercase(), "")))
            .collect();
        let store = RecordStore::new(dataset);
        let ids: Vec<_> = store.records().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(store.get("a").map(|r| r.name.as_str()), Some("A"));
        assert!(store.get("A").is_none());

        let shared = store.clone();
        assert_eq!(shared.len(), 3);
    }
}
