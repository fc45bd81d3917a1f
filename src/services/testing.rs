//! In-memory `PageSource` for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::utils::http::{FetchOutcome, PageSource};

/// Serves canned outcomes by URL; unknown URLs answer 404.
#[derive(Default)]
pub struct StaticSource {
    pages: HashMap<String, FetchOutcome>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: AtomicUsize,
    starts: Mutex<Vec<Instant>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages
            .insert(url.to_string(), FetchOutcome::Success(html.to_string()));
        self
    }

    pub fn status(mut self, url: &str, code: u16) -> Self {
        self.pages.insert(url.to_string(), FetchOutcome::Status(code));
        self
    }

    pub fn transport_error(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchOutcome::Transport("connection reset".to_string()),
        );
        self
    }

    /// Delay every request by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Delay requests for one URL by `delay`.
    pub fn slow(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// Highest number of requests observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// When each request arrived, in arrival order.
    pub fn request_starts(&self) -> Vec<Instant> {
        self.starts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for StaticSource {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.starts.lock().unwrap().push(Instant::now());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(url).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .unwrap_or(FetchOutcome::Status(404))
    }
}
