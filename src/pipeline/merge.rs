// src/pipeline/merge.rs

//! Merging a fresh crawl into the persisted dataset.

use crate::models::Dataset;

/// A merged dataset and what the merge did.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub dataset: Dataset,
    /// Fresh keys that were not persisted before
    pub added: usize,
    /// Persisted keys replaced by a fresh Record
    pub replaced: usize,
    /// Persisted keys absent from the fresh crawl and kept
    pub carried: usize,
    /// Persisted keys absent from the fresh crawl and dropped
    pub dropped: usize,
}

/// Merge `fresh` over `previous` at key granularity.
///
/// A fresh Record replaces the whole persisted Record at its key and keeps
/// that key's position; new keys follow in fresh order. Persisted keys the
/// crawl did not see are kept unless `drop_stale` is set, in which case the
/// result is exactly `fresh`.
pub fn merge(previous: Dataset, fresh: Dataset, drop_stale: bool) -> MergeOutcome {
    let replaced = fresh.keys().filter(|k| previous.contains_key(*k)).count();
    let added = fresh.len() - replaced;
    let stale = previous.len() - replaced;

    if drop_stale {
        return MergeOutcome {
            dataset: fresh,
            added,
            replaced,
            carried: 0,
            dropped: stale,
        };
    }

    let mut dataset = previous;
    for (key, record) in fresh {
        dataset.insert(key, record);
    }

    MergeOutcome {
        dataset,
        added,
        replaced,
        carried: stale,
        dropped: 0,
    }
}
