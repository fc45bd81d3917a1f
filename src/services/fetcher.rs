// src/services/fetcher.rs

//! Bounded concurrent page fetching.
//!
//! Every job ends with a Record: the extracted one on success, or a stub
//! carrying a missing-tag when the fetch failed. A failed job never affects
//! its siblings, and results come back in job order once all jobs are done.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::models::{CrawlItem, CrawlerConfig, Record};
use crate::utils::http::{FetchOutcome, PageSource};

/// One page to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    /// Human-readable title
    pub title: String,
    /// Dataset identifier
    pub id: String,
    /// Page URL
    pub url: String,
}

/// Records of a finished batch, in job order.
#[derive(Debug, Default)]
pub struct FetchBatch {
    pub items: Vec<CrawlItem>,
    pub failures: usize,
}

/// Fetches pages with a concurrency cap and per-item timeout.
pub struct ConcurrentFetcher<'a> {
    source: &'a dyn PageSource,
    concurrency: usize,
    item_timeout: Duration,
    request_delay: Duration,
    run_deadline: Option<Duration>,
    progress_every: usize,
}

impl<'a> ConcurrentFetcher<'a> {
    /// Create a fetcher with limits taken from crawler settings.
    pub fn new(source: &'a dyn PageSource, config: &CrawlerConfig) -> Self {
        Self {
            source,
            concurrency: config.max_concurrent.max(1),
            item_timeout: Duration::from_secs(config.timeout_secs),
            request_delay: Duration::from_millis(config.request_delay_ms),
            run_deadline: config.run_deadline_secs.map(Duration::from_secs),
            progress_every: config.progress_every,
        }
    }

    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = timeout;
        self
    }

    pub fn with_run_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.run_deadline = deadline;
        self
    }

    /// Fetch every job and turn successful pages into Records with `extract`.
    ///
    /// Extraction runs on the collecting task, one page at a time; only the
    /// network requests overlap.
    pub async fn fetch_all<F>(&self, jobs: Vec<FetchJob>, extract: F) -> FetchBatch
    where
        F: Fn(&FetchJob, &str) -> Record,
    {
        let total = jobs.len();
        let started = Instant::now();
        // A deadline too far out to represent is no deadline.
        let deadline = self.run_deadline.and_then(|d| started.checked_add(d));
        let mut throughput = Throughput::new(total, self.progress_every);

        log::info!(
            "Fetching {} pages ({} concurrent, {}s timeout)",
            total,
            self.concurrency,
            self.item_timeout.as_secs_f64()
        );

        let mut results = stream::iter(jobs.into_iter().enumerate())
            .map(|(index, job)| async move {
                let outcome = self.fetch_one(&job.url, started, index, deadline).await;
                (job, outcome)
            })
            .buffered(self.concurrency);

        let mut batch = FetchBatch {
            items: Vec::with_capacity(total),
            failures: 0,
        };

        while let Some((job, outcome)) = results.next().await {
            let record = match outcome {
                FetchOutcome::Success(html) => extract(&job, &html),
                failure => {
                    batch.failures += 1;
                    log::warn!("Failed to fetch {} ({}): {}", job.title, job.url, failure.describe());
                    let tag = failure.missing_tag().unwrap_or_else(|| "http_error".to_string());
                    Record::stub(&job.id, &job.title, &job.url, tag)
                }
            };

            batch.items.push(CrawlItem::new(job.title, record));
            throughput.tick();
        }

        log::info!(
            "Fetched {} pages in {:.1}s ({} failed)",
            total,
            started.elapsed().as_secs_f64(),
            batch.failures
        );
        batch
    }

    /// Job `index` may not start before `started + index * request_delay`,
    /// so requests stay spaced by the delay whatever the concurrency.
    fn start_slot(&self, started: Instant, index: usize) -> Option<Instant> {
        let steps = u32::try_from(index).unwrap_or(u32::MAX);
        started.checked_add(self.request_delay.saturating_mul(steps))
    }

    async fn fetch_one(
        &self,
        url: &str,
        started: Instant,
        index: usize,
        deadline: Option<Instant>,
    ) -> FetchOutcome {
        let past_deadline = |at: Instant| deadline.is_some_and(|d| at >= d);

        if past_deadline(Instant::now()) {
            return FetchOutcome::DeadlineExceeded;
        }

        if !self.request_delay.is_zero() {
            match self.start_slot(started, index) {
                Some(slot) if past_deadline(slot) => return FetchOutcome::DeadlineExceeded,
                Some(slot) => tokio::time::sleep_until(slot).await,
                None if deadline.is_some() => return FetchOutcome::DeadlineExceeded,
                None => {}
            }
        }

        let item_limit = Instant::now().checked_add(self.item_timeout);
        let limit = match (deadline, item_limit) {
            (Some(d), Some(i)) => Some(d.min(i)),
            (d, i) => d.or(i),
        };
        let Some(limit) = limit else {
            return self.source.fetch(url).await;
        };

        match tokio::time::timeout_at(limit, self.source.fetch(url)).await {
            Ok(outcome) => outcome,
            Err(_) if past_deadline(Instant::now()) => FetchOutcome::DeadlineExceeded,
            Err(_) => FetchOutcome::Timeout,
        }
    }
}

/// Progress telemetry: completed count, rate and ETA.
struct Throughput {
    total: usize,
    every: usize,
    done: usize,
    started: Instant,
}

impl Throughput {
    fn new(total: usize, every: usize) -> Self {
        Self {
            total,
            every,
            done: 0,
            started: Instant::now(),
        }
    }

    fn tick(&mut self) {
        self.done += 1;
        if self.every == 0 || (self.done % self.every != 0 && self.done != self.total) {
            return;
        }

        let (rate, eta) = estimate(self.done, self.total, self.started.elapsed());
        match eta {
            Some(eta) => log::info!(
                "[{}/{}] {:.1} pages/s, ETA {:.0}s",
                self.done,
                self.total,
                rate,
                eta.as_secs_f64()
            ),
            None => log::info!("[{}/{}] {:.1} pages/s", self.done, self.total, rate),
        }
    }
}

/// Pages per second so far and the time left at that rate.
fn estimate(done: usize, total: usize, elapsed: Duration) -> (f64, Option<Duration>) {
    let secs = elapsed.as_secs_f64();
    if done == 0 || secs <= 0.0 {
        return (0.0, None);
    }
    let rate = done as f64 / secs;
    let remaining = total.saturating_sub(done) as f64;
    (rate, Some(Duration::from_secs_f64(remaining / rate)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::StaticSource;

    fn job(title: &str) -> FetchJob {
        FetchJob {
            title: title.to_string(),
            id: crate::utils::slug(title),
            url: format!("https://wiki.test/wiki/{}", title.replace(' ', "_")),
        }
    }

    fn extract_marker(job: &FetchJob, html: &str) -> Record {
        let mut record = Record::new(&job.id, &job.title, &job.url);
        record.insert("body", html);
        record
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let source = StaticSource::new()
            .page("https://wiki.test/wiki/Cod", "cod page")
            .status("https://wiki.test/wiki/Salmon", 404)
            .transport_error("https://wiki.test/wiki/Trout")
            .page("https://wiki.test/wiki/Pike", "pike page")
            .slow("https://wiki.test/wiki/Pike", Duration::from_millis(500))
            .page("https://wiki.test/wiki/Carp", "carp page");

        let jobs = ["Cod", "Salmon", "Trout", "Pike", "Carp"].map(job).to_vec();
        let fetcher = ConcurrentFetcher::new(&source, &CrawlerConfig::default())
            .with_item_timeout(Duration::from_millis(100));
        let batch = fetcher.fetch_all(jobs, extract_marker).await;

        assert_eq!(batch.items.len(), 5);
        assert_eq!(batch.failures, 3);

        let titles: Vec<_> = batch.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Cod", "Salmon", "Trout", "Pike", "Carp"]);

        let cod = &batch.items[0].record;
        assert_eq!(cod.get("body").and_then(|v| v.as_text()), Some("cod page"));
        assert!(cod.missing.is_empty());

        let salmon = &batch.items[1].record;
        assert!(salmon.is_stub());
        assert_eq!(salmon.missing, ["http_404"]);
        assert_eq!(salmon.url, "https://wiki.test/wiki/Salmon");

        assert_eq!(batch.items[2].record.missing, ["http_error"]);
        assert_eq!(batch.items[3].record.missing, ["timeout"]);

        let carp = &batch.items[4].record;
        assert_eq!(carp.get("body").and_then(|v| v.as_text()), Some("carp page"));
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_enforced() {
        let titles: Vec<String> = (0..20).map(|i| format!("Fish {i}")).collect();
        let mut source = StaticSource::new().with_delay(Duration::from_millis(10));
        for title in &titles {
            source = source.page(&job(title).url, "ok");
        }

        let config = CrawlerConfig {
            max_concurrent: 4,
            ..CrawlerConfig::default()
        };
        let jobs = titles.iter().map(|t| job(t)).collect();
        let batch = ConcurrentFetcher::new(&source, &config)
            .fetch_all(jobs, extract_marker)
            .await;

        assert_eq!(batch.items.len(), 20);
        assert_eq!(batch.failures, 0);
        assert_eq!(source.request_count(), 20);
        assert_eq!(source.max_in_flight(), 4);
    }

    #[tokio::test]
    async fn test_run_deadline_resolves_every_item() {
        let titles: Vec<String> = (0..10).map(|i| format!("Fish {i}")).collect();
        let mut source = StaticSource::new().with_delay(Duration::from_millis(40));
        for title in &titles {
            source = source.page(&job(title).url, "ok");
        }

        let config = CrawlerConfig {
            max_concurrent: 1,
            ..CrawlerConfig::default()
        };
        let jobs = titles.iter().map(|t| job(t)).collect();
        let batch = ConcurrentFetcher::new(&source, &config)
            .with_run_deadline(Some(Duration::from_millis(150)))
            .fetch_all(jobs, extract_marker)
            .await;

        assert_eq!(batch.items.len(), 10);
        assert!(batch.items[0].record.missing.is_empty());
        assert_eq!(batch.items[9].record.missing, ["deadline_exceeded"]);
        assert!(source.request_count() < 10);
    }

    #[tokio::test]
    async fn test_unbounded_limits_do_not_overflow() {
        let source = StaticSource::new()
            .page("https://wiki.test/wiki/Cod", "cod page")
            .with_delay(Duration::from_millis(5));
        let config = CrawlerConfig {
            timeout_secs: u64::MAX,
            run_deadline_secs: Some(u64::MAX),
            ..CrawlerConfig::default()
        };
        let batch = ConcurrentFetcher::new(&source, &config)
            .fetch_all(vec![job("Cod")], extract_marker)
            .await;
        assert_eq!(batch.failures, 0);

        let batch = ConcurrentFetcher::new(&source, &CrawlerConfig::default())
            .with_item_timeout(Duration::MAX)
            .with_run_deadline(Some(Duration::MAX))
            .fetch_all(vec![job("Cod")], extract_marker)
            .await;
        assert_eq!(batch.failures, 0);
        assert_eq!(
            batch.items[0].record.get("body").and_then(|v| v.as_text()),
            Some("cod page")
        );
    }

    #[tokio::test]
    async fn test_request_delay_spaces_request_starts() {
        let titles: Vec<String> = (0..5).map(|i| format!("Fish {i}")).collect();
        let mut source = StaticSource::new();
        for title in &titles {
            source = source.page(&job(title).url, "ok");
        }

        let config = CrawlerConfig {
            max_concurrent: 10,
            request_delay_ms: 20,
            ..CrawlerConfig::default()
        };
        let jobs = titles.iter().map(|t| job(t)).collect();
        let batch = ConcurrentFetcher::new(&source, &config)
            .fetch_all(jobs, extract_marker)
            .await;
        assert_eq!(batch.failures, 0);

        let starts = source.request_starts();
        assert_eq!(starts.len(), 5);
        for pair in starts.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert!(starts[4] - starts[0] >= Duration::from_millis(70));
    }

    #[tokio::test]
    async fn test_request_delay_counts_against_run_deadline() {
        let titles: Vec<String> = (0..6).map(|i| format!("Fish {i}")).collect();
        let mut source = StaticSource::new();
        for title in &titles {
            source = source.page(&job(title).url, "ok");
        }

        let config = CrawlerConfig {
            max_concurrent: 6,
            request_delay_ms: 50,
            ..CrawlerConfig::default()
        };
        let jobs = titles.iter().map(|t| job(t)).collect();
        let started = Instant::now();
        let batch = ConcurrentFetcher::new(&source, &config)
            .with_run_deadline(Some(Duration::from_millis(120)))
            .fetch_all(jobs, extract_marker)
            .await;

        assert_eq!(batch.items.len(), 6);
        assert!(batch.items[0].record.missing.is_empty());
        assert_eq!(batch.items[5].record.missing, ["deadline_exceeded"]);
        assert!(source.request_count() <= 3);
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let source = StaticSource::new();
        let batch = ConcurrentFetcher::new(&source, &CrawlerConfig::default())
            .fetch_all(Vec::new(), extract_marker)
            .await;
        assert!(batch.items.is_empty());
        assert_eq!(batch.failures, 0);
    }

    #[test]
    fn test_estimate() {
        let (rate, eta) = estimate(10, 30, Duration::from_secs(5));
        assert!((rate - 2.0).abs() < f64::EPSILON);
        assert_eq!(eta, Some(Duration::from_secs(10)));
        assert_eq!(estimate(0, 30, Duration::from_secs(5)), (0.0, None));
    }
}
