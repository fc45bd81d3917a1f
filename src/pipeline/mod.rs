//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: enumerate, fetch, extract, merge and persist one target
//! - `merge`: key-granular merge of a fresh crawl into a persisted dataset

pub mod crawl;
pub mod merge;

pub use crawl::{CrawlReport, DatasetReport, run_crawler};
pub use merge::{MergeOutcome, merge};
