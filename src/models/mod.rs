// src/models/mod.rs

//! Domain models for the crawler and lookup engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod category;
mod config;
mod record;
mod stats;

// Re-export all public types
pub use category::{Category, CrawlTarget};
pub use config::{
    Config, CrawlerConfig, ListSection, ListingScope, MergeConfig, PageSourceConfig, PathsConfig,
    SourcesConfig, TableSection, TableSourceConfig,
};
pub use record::{Dataset, FieldValue, RESERVED_KEYS, Record, fill_ids};
pub use stats::CrawlStats;

/// One processed item of a crawl run, in run order.
#[derive(Debug, Clone)]
pub struct CrawlItem {
    /// Human-readable title the item was crawled under
    pub title: String,

    /// The Record produced for it (possibly a stub)
    pub record: Record,
}

impl CrawlItem {
    pub fn new(title: impl Into<String>, record: Record) -> Self {
        Self {
            title: title.into(),
            record,
        }
    }
}
