//! Lookup over crawled datasets.
//!
//! A `Catalog` holds one `RecordStore` per dataset and is what a presentation
//! layer (a bot, the CLI) receives. Everything here is read-only.

pub mod matcher;
pub mod store;

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{Category, Dataset};
use crate::storage::DatasetStorage;

pub use matcher::{MAX_SUGGESTIONS, MatchResult, Suggestion};
pub use store::RecordStore;

/// Record Stores by dataset.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    stores: HashMap<Category, RecordStore>,
}

impl Catalog {
    pub fn from_datasets(datasets: impl IntoIterator<Item = (Category, Dataset)>) -> Self {
        Self {
            stores: datasets
                .into_iter()
                .map(|(category, dataset)| (category, RecordStore::new(dataset)))
                .collect(),
        }
    }

    /// Load a snapshot of every dataset from storage.
    pub async fn load(storage: &dyn DatasetStorage) -> Self {
        let mut stores = HashMap::new();
        for category in Category::ALL {
            let store = RecordStore::new(storage.load_dataset(category).await);
            log::debug!("Catalog: {} records in {}", store.len(), category);
            stores.insert(category, store);
        }
        Self { stores }
    }

    /// The store for a dataset name or alias.
    pub fn store(&self, dataset: &str) -> Result<&RecordStore> {
        let category: Category = dataset.parse()?;
        self.stores
            .get(&category)
            .ok_or_else(|| AppError::unknown_dataset(dataset))
    }

    pub fn lookup(&self, query: &str, dataset: &str) -> Result<MatchResult<'_>> {
        Ok(self.store(dataset)?.lookup(query))
    }

    pub fn suggest(&self, prefix: &str, dataset: &str, limit: usize) -> Result<Vec<Suggestion>> {
        Ok(self.store(dataset)?.suggest(prefix, limit))
    }

    /// Record counts in category order.
    pub fn counts(&self) -> Vec<(Category, usize)> {
        Category::ALL
            .into_iter()
            .filter_map(|c| self.stores.get(&c).map(|s| (c, s.len())))
            .collect()
    }
}
