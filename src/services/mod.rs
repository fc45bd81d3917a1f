//! Service layer for the crawler.
//!
//! - Title discovery from listing pages (`TitleEnumerator`)
//! - Bounded concurrent fetching (`ConcurrentFetcher`)
//! - Infobox extraction (`FieldExtractor`)
//! - Enchantment table extraction (`TableExtractor`)

mod extractor;
mod fetcher;
mod tables;
mod titles;

#[cfg(test)]
pub(crate) mod testing;

pub use extractor::{FieldExtractor, PANEL_MISSING};
pub use fetcher::{ConcurrentFetcher, FetchBatch, FetchJob};
pub use tables::{
    EFFECT_MISSING, SECTION_MISSING, TABLE_MISSING, TableDatasets, TableExtractor, split_effects,
};
pub use titles::{TitleEnumerator, extract_titles};
