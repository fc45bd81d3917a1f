//! Local filesystem storage.
//!
//! Datasets are written to a temporary file and renamed into place, so a
//! crash mid-write leaves the previous dataset intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Category, CrawlStats, Dataset, PathsConfig, fill_ids};
use crate::storage::{DatasetStorage, WriteMetadata};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(data_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_dir: log_dir.into(),
        }
    }

    /// Storage with directories resolved against `root`.
    pub fn from_config(paths: &PathsConfig, root: &Path) -> Self {
        Self::new(paths.resolve_data_dir(root), paths.resolve_log_dir(root))
    }

    pub fn dataset_path(&self, category: Category) -> PathBuf {
        self.data_dir.join(category.file_name())
    }

    pub fn stats_path(&self, category: Category) -> PathBuf {
        self.data_dir.join(format!("{}.stats.json", category.name()))
    }

    pub fn log_path(&self, category: Category) -> PathBuf {
        self.log_dir.join(format!("{}.log", category.name()))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<Vec<u8>> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await?;
        Ok(bytes)
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl DatasetStorage for LocalStorage {
    async fn load_dataset(&self, category: Category) -> Dataset {
        let path = self.dataset_path(category);
        let bytes = match self.read_bytes(&path).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::warn!("No {} dataset at {}", category, path.display());
                return Dataset::new();
            }
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                return Dataset::new();
            }
        };

        match serde_json::from_slice::<Dataset>(&bytes) {
            Ok(mut dataset) => {
                fill_ids(&mut dataset);
                log::debug!("Loaded {} {} records", dataset.len(), category);
                dataset
            }
            Err(e) => {
                log::warn!("Ignoring corrupt dataset {}: {}", path.display(), e);
                Dataset::new()
            }
        }
    }

    async fn write_dataset(&self, category: Category, dataset: &Dataset) -> Result<WriteMetadata> {
        let path = self.dataset_path(category);
        let bytes = self.write_json(&path, dataset).await?;

        log::info!("{} records written to {}", dataset.len(), path.display());

        Ok(WriteMetadata {
            location: path.display().to_string(),
            count: dataset.len(),
            sha256: hex::encode(Sha256::digest(&bytes)),
        })
    }

    async fn append_run_log(&self, category: Category, lines: &[String]) -> Result<()> {
        let path = self.log_path(category);
        self.ensure_dir(&path).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let mut buf = String::new();
        for line in lines {
            buf.push_str(line);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn write_stats(&self, stats: &CrawlStats) -> Result<()> {
        self.write_json(&self.stats_path(stats.category), stats)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use chrono::Utc;
    use tempfile::TempDir;

    fn storage(tmp: &TempDir) -> LocalStorage {
        LocalStorage::new(tmp.path().join("data"), tmp.path().join("logs"))
    }

    fn dataset() -> Dataset {
        let mut dataset = Dataset::new();
        for (id, name) in [("cod", "Cod"), ("anglers_fish", "Angler's Fish")] {
            let mut record = Record::new(id, name, format!("https://wiki.test/wiki/{name}"));
            record.insert("rarity", "Common");
            dataset.insert(id.to_string(), record);
        }
        dataset
    }

    #[tokio::test]
    async fn test_write_and_load_dataset() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        let meta = storage.write_dataset(Category::Creatures, &dataset()).await.unwrap();
        assert_eq!(meta.count, 2);
        assert_eq!(meta.sha256.len(), 64);

        let loaded = storage.load_dataset(Category::Creatures).await;
        assert_eq!(loaded, dataset());
        let keys: Vec<_> = loaded.keys().map(String::as_str).collect();
        assert_eq!(keys, ["cod", "anglers_fish"]);

        assert!(tmp.path().join("data/bestiary.json").exists());
        assert!(!tmp.path().join("data/bestiary.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_dataset_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(storage(&tmp).load_dataset(Category::Tools).await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_dataset_is_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let path = storage.dataset_path(Category::Tools);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        assert!(storage.load_dataset(Category::Tools).await.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_records_get_ids() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let path = storage.dataset_path(Category::Enchantments);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(
            &path,
            br#"{"abyssal": {"name": "Abyssal", "category": "regular", "effect": ["Deep"]}}"#,
        )
        .await
        .unwrap();

        let loaded = storage.load_dataset(Category::Enchantments).await;
        let abyssal = &loaded["abyssal"];
        assert_eq!(abyssal.id, "abyssal");
        assert_eq!(abyssal.url, "");
        assert_eq!(
            abyssal.get("category").and_then(|v| v.as_text()),
            Some("regular")
        );
    }

    #[tokio::test]
    async fn test_run_log_appends() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);

        storage
            .append_run_log(Category::Creatures, &["first".to_string()])
            .await
            .unwrap();
        storage
            .append_run_log(Category::Creatures, &["second".to_string(), "third".to_string()])
            .await
            .unwrap();

        let log = tokio::fs::read_to_string(storage.log_path(Category::Creatures))
            .await
            .unwrap();
        assert_eq!(log, "first\nsecond\nthird\n");
    }

    #[tokio::test]
    async fn test_write_stats() {
        let tmp = TempDir::new().unwrap();
        let storage = storage(&tmp);
        let now = Utc::now();
        let stats = CrawlStats {
            category: Category::Tools,
            start_time: now,
            end_time: now,
            item_count: 3,
            failure_count: 1,
            incomplete_count: 1,
            dataset_size: 10,
            sha256: "00".repeat(32),
        };
        storage.write_stats(&stats).await.unwrap();

        let bytes = tokio::fs::read(tmp.path().join("data/tools.stats.json"))
            .await
            .unwrap();
        let loaded: CrawlStats = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(loaded, stats);
    }
}
