// src/pipeline/crawl.rs

//! Crawl pipeline: enumerate, fetch, extract, merge, persist.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    Category, Config, CrawlItem, CrawlStats, CrawlTarget, Dataset, PageSourceConfig,
};
use crate::pipeline::merge::merge;
use crate::services::{ConcurrentFetcher, FetchJob, FieldExtractor, TableExtractor, TitleEnumerator};
use crate::storage::DatasetStorage;
use crate::utils::http::{FetchOutcome, PageSource};
use crate::utils::slug;

/// Summary of one written dataset.
#[derive(Debug, Clone)]
pub struct DatasetReport {
    pub stats: CrawlStats,
    /// Where the dataset was written
    pub location: String,
}

/// Summary of a crawl run.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub target: CrawlTarget,
    pub datasets: Vec<DatasetReport>,
}

/// Run one crawl target end to end.
///
/// Only an unreachable listing page (or enchantment page) fails the run;
/// every other failure ends up as a missing-tag on a Record.
pub async fn run_crawler(
    config: &Config,
    storage: &dyn DatasetStorage,
    source: &dyn PageSource,
    target: CrawlTarget,
) -> Result<CrawlReport> {
    log::info!("Crawling {}", target);

    let datasets = match target {
        CrawlTarget::Creatures => vec![
            crawl_pages(config, storage, source, Category::Creatures, &config.sources.creatures)
                .await?,
        ],
        CrawlTarget::Tools => vec![
            crawl_pages(config, storage, source, Category::Tools, &config.sources.tools).await?,
        ],
        CrawlTarget::Enchantments => crawl_tables(config, storage, source).await?,
    };

    for report in &datasets {
        let stats = &report.stats;
        log::info!(
            "{}: {} items ({} failed, {:.1}% fetched, {} incomplete), {} records in {}",
            stats.category,
            stats.item_count,
            stats.failure_count,
            stats.success_rate() * 100.0,
            stats.incomplete_count,
            stats.dataset_size,
            report.location
        );
    }

    Ok(CrawlReport { target, datasets })
}

/// Listing page, then one fetched page per title.
async fn crawl_pages(
    config: &Config,
    storage: &dyn DatasetStorage,
    source: &dyn PageSource,
    category: Category,
    pages: &PageSourceConfig,
) -> Result<DatasetReport> {
    let start_time = Utc::now();

    let titles = TitleEnumerator::new(source, pages).enumerate().await?;
    let extractor = FieldExtractor::new(&pages.list_sections)?;

    let jobs: Vec<FetchJob> = titles
        .into_iter()
        .map(|title| FetchJob {
            id: slug(&title),
            url: pages.page_url(&title),
            title,
        })
        .collect();

    let batch = ConcurrentFetcher::new(source, &config.crawler)
        .fetch_all(jobs, |job, html| {
            extractor.extract(html, &job.id, &job.title, &job.url)
        })
        .await;

    let mut fresh = Dataset::with_capacity(batch.items.len());
    for item in &batch.items {
        if fresh.contains_key(&item.record.id) {
            log::warn!("Duplicate identifier '{}' from '{}'", item.record.id, item.title);
        }
        fresh.insert(item.record.id.clone(), item.record.clone());
    }

    persist(
        config,
        storage,
        category,
        &batch.items,
        fresh,
        batch.failures,
        start_time,
    )
    .await
}

/// One page holding both enchantment datasets.
async fn crawl_tables(
    config: &Config,
    storage: &dyn DatasetStorage,
    source: &dyn PageSource,
) -> Result<Vec<DatasetReport>> {
    let start_time = Utc::now();
    let tables = &config.sources.enchantments;

    log::info!("Fetching enchantment page {}", tables.url);
    let html = match source.fetch(&tables.url).await {
        FetchOutcome::Success(html) => html,
        failure => {
            log::error!("Enchantment page {} failed: {}", tables.url, failure.describe());
            return Err(AppError::listing(&tables.url, failure.describe()));
        }
    };

    let data = TableExtractor::new(tables)?.extract(&html, &tables.url);

    let mut reports = Vec::with_capacity(2);
    for (category, dataset) in [
        (Category::Enchantments, data.enchantments),
        (Category::EnchantmentCategories, data.categories),
    ] {
        let items: Vec<CrawlItem> = dataset
            .values()
            .map(|r| CrawlItem::new(r.display_name(), r.clone()))
            .collect();
        reports.push(persist(config, storage, category, &items, dataset, 0, start_time).await?);
    }
    Ok(reports)
}

/// Merge with the persisted dataset, write it, append the run log and stats.
async fn persist(
    config: &Config,
    storage: &dyn DatasetStorage,
    category: Category,
    items: &[CrawlItem],
    fresh: Dataset,
    failures: usize,
    start_time: DateTime<Utc>,
) -> Result<DatasetReport> {
    let previous = storage.load_dataset(category).await;
    let outcome = merge(previous, fresh, config.merge.drop_stale);
    log::info!(
        "{}: {} added, {} replaced, {} carried over, {} dropped",
        category,
        outcome.added,
        outcome.replaced,
        outcome.carried,
        outcome.dropped
    );

    let written = storage.write_dataset(category, &outcome.dataset).await?;
    storage.append_run_log(category, &run_log_lines(items)).await?;

    let stats = CrawlStats {
        category,
        start_time,
        end_time: Utc::now(),
        item_count: items.len(),
        failure_count: failures,
        incomplete_count: items.iter().filter(|i| !i.record.missing.is_empty()).count(),
        dataset_size: written.count,
        sha256: written.sha256,
    };
    storage.write_stats(&stats).await?;

    Ok(DatasetReport {
        stats,
        location: written.location,
    })
}

/// One line per processed item: `[index/total] <title> — missing: [<tags>]`.
pub fn run_log_lines(items: &[CrawlItem]) -> Vec<String> {
    let total = items.len();
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "[{}/{}] {} — missing: [{}]",
                i + 1,
                total,
                item.title,
                item.record.missing.join(", ")
            )
        })
        .collect()
}
