//! Per-run crawl statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

/// Statistics for one dataset written by a crawl run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub category: Category,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// Items processed this run
    pub item_count: usize,

    /// Items whose page could not be fetched
    pub failure_count: usize,

    /// Items carrying at least one missing-tag
    pub incomplete_count: usize,

    /// Records in the dataset after merging
    pub dataset_size: usize,

    /// SHA-256 of the written dataset file
    pub sha256: String,
}

impl CrawlStats {
    /// Share of processed items that were fetched.
    pub fn success_rate(&self) -> f64 {
        if self.item_count == 0 {
            return 1.0;
        }
        (self.item_count - self.failure_count.min(self.item_count)) as f64 / self.item_count as f64
    }
}
