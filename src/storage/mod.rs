//! Storage abstractions for dataset persistence.
//!
//! ```text
//! {data_dir}/
//! ├── bestiary.json                 # one pretty-printed dataset per category
//! ├── rods.json
//! ├── enchants.json
//! ├── enchant_categories.json
//! └── <category>.stats.json         # stats of the last run
//! {log_dir}/
//! └── <category>.log                # run log, appended
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Category, CrawlStats, Dataset};

pub use local::LocalStorage;

/// Metadata about a dataset write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Where the dataset was written
    pub location: String,
    /// Number of Records written
    pub count: usize,
    /// SHA-256 of the written bytes, hex encoded
    pub sha256: String,
}

/// Trait for dataset storage backends.
#[async_trait]
pub trait DatasetStorage: Send + Sync {
    /// Load the persisted dataset.
    ///
    /// A missing or unreadable dataset loads as empty; the crawl that follows
    /// rebuilds it.
    async fn load_dataset(&self, category: Category) -> Dataset;

    /// Replace the persisted dataset. Readers never observe a partial file.
    async fn write_dataset(&self, category: Category, dataset: &Dataset) -> Result<WriteMetadata>;

    /// Append lines to the category's run log.
    async fn append_run_log(&self, category: Category, lines: &[String]) -> Result<()>;

    /// Write statistics of the latest run.
    async fn write_stats(&self, stats: &CrawlStats) -> Result<()>;
}
