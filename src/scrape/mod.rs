// src/scrape/mod.rs
pub mod extract;
pub mod fetch;
pub mod latch;
pub mod scheduler;
pub mod types;

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::index::SearchIndex;
use crate::scrape::latch::CompletionLatch;
use crate::scrape::types::{FetchResult, Item, PageFetcher, ScrapedItem};
use crate::store::PostStore;
use crate::update;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_runs_total", "Completed scrape runs.");
        describe_counter!("scrape_items_total", "Items selected for scraping.");
        describe_counter!(
            "scrape_fetch_failures_total",
            "Fetches that ended without a usable body."
        );
        describe_counter!(
            "scrape_eligible_total",
            "Items with both preview fields extracted."
        );
        describe_counter!("scrape_store_errors_total", "Primary store update errors.");
        describe_counter!(
            "scrape_images_inserted_total",
            "Image records created for posts."
        );
        describe_counter!(
            "scrape_image_errors_total",
            "Image count or insert errors after a successful record update."
        );
        describe_counter!("scrape_index_errors_total", "Search index update errors.");
        describe_histogram!("scrape_fetch_ms", "Page fetch time in milliseconds.");
        describe_gauge!("scrape_last_run_ts", "Unix ts when a scrape run last finished.");
    });
}

/// How many fetch tasks may be in flight at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConcurrencyLimit {
    /// One task per item, all started together.
    #[default]
    Unbounded,
    Max(usize),
}

impl ConcurrencyLimit {
    /// `None` and `Some(0)` both mean unbounded.
    pub fn from_option(max: Option<usize>) -> Self {
        match max {
            Some(n) if n > 0 => Self::Max(n),
            _ => Self::Unbounded,
        }
    }

    fn semaphore(self) -> Option<Arc<Semaphore>> {
        match self {
            Self::Unbounded => None,
            Self::Max(n) => Some(Arc::new(Semaphore::new(n))),
        }
    }
}

/// A fetch task's place in the result queue. Dropped unfilled (the fetcher
/// panicked or the task was cancelled), it reports an empty result instead.
struct ResultSlot {
    pending: Option<Item>,
    tx: mpsc::Sender<FetchResult>,
}

impl ResultSlot {
    fn new(item: Item, tx: mpsc::Sender<FetchResult>) -> Self {
        Self {
            pending: Some(item),
            tx,
        }
    }

    fn fill(mut self, result: FetchResult) {
        self.pending = None;
        self.send(result);
    }

    fn send(&self, result: FetchResult) {
        if let Err(e) = self.tx.try_send(result) {
            tracing::warn!(target: "scrape", error = %e, "dropping fetch result");
        }
    }
}

impl Drop for ResultSlot {
    fn drop(&mut self) {
        if let Some(item) = self.pending.take() {
            tracing::warn!(target: "scrape", item_id = item.id, url = %item.url, "fetch task ended without a result");
            counter!("scrape_fetch_failures_total").increment(1);
            self.send(FetchResult::empty(item));
        }
    }
}

/// Fetches every item concurrently and returns exactly one result per item,
/// in completion order.
pub async fn fetch_all(
    fetcher: Arc<dyn PageFetcher>,
    items: Vec<Item>,
    limit: ConcurrencyLimit,
) -> Vec<FetchResult> {
    let expected = items.len();
    if expected == 0 {
        return Vec::new();
    }

    // Capacity equals the batch, so no task ever waits on a full queue.
    let (tx, mut rx) = mpsc::channel::<FetchResult>(expected);
    let latch = CompletionLatch::new(expected);
    let permits = limit.semaphore();

    for item in items {
        let fetcher = Arc::clone(&fetcher);
        let tx = tx.clone();
        let permits = permits.clone();
        let done = latch.guard();
        tokio::spawn(async move {
            // Declared first so it drops last, after the slot has reported.
            let _done = done;
            let slot = ResultSlot::new(item.clone(), tx);
            let _permit = match permits {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };
            slot.fill(fetcher.fetch(item).await);
        });
    }
    drop(tx);

    latch.wait().await;
    rx.close();
    tracing::info!(target: "scrape", items = expected, "finished fetching pages");

    let mut results = Vec::with_capacity(expected);
    while results.len() < expected {
        match rx.recv().await {
            Some(r) => results.push(r),
            None => break,
        }
    }
    if results.len() < expected {
        tracing::warn!(
            target: "scrape",
            expected,
            received = results.len(),
            "fetch tasks ended without a result"
        );
    }
    results
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub items: usize,
    pub fetched: usize,
    pub eligible: usize,
    pub stored: usize,
    pub images_inserted: usize,
    pub indexed: usize,
}

/// Everything one scrape run needs; built fresh for each run.
pub struct Scraper {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn PostStore>,
    index: Arc<dyn SearchIndex>,
    window_minutes: u32,
    limit: ConcurrencyLimit,
}

impl Scraper {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn PostStore>,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            fetcher,
            store,
            index,
            window_minutes: 60,
            limit: ConcurrencyLimit::Unbounded,
        }
    }

    pub fn with_window_minutes(mut self, minutes: u32) -> Self {
        self.window_minutes = minutes;
        self
    }

    pub fn with_concurrency(mut self, limit: ConcurrencyLimit) -> Self {
        self.limit = limit;
        self
    }

    /// Select, fetch, extract, and persist. Only the item query can fail the run.
    pub async fn run_once(&self) -> Result<RunReport> {
        ensure_metrics_described();

        let items = self
            .store
            .recent_items(self.window_minutes)
            .await
            .context("selecting posts to scrape")?;

        let mut report = RunReport {
            items: items.len(),
            ..RunReport::default()
        };
        counter!("scrape_items_total").increment(items.len() as u64);
        tracing::info!(target: "scrape", items = items.len(), window_minutes = self.window_minutes, "starting scrape run");

        let results = fetch_all(Arc::clone(&self.fetcher), items, self.limit).await;

        for result in results {
            if result.is_success() {
                report.fetched += 1;
            }
            tracing::debug!(target: "scrape", post_id = result.item.id, url = %result.item.url, "parsing page");

            let scraped = ScrapedItem::from_fetch(result);
            if !scraped.is_eligible() {
                continue;
            }
            report.eligible += 1;
            counter!("scrape_eligible_total").increment(1);

            let outcome = update::apply(self.store.as_ref(), self.index.as_ref(), &scraped).await;
            report.stored += usize::from(outcome.stored);
            report.images_inserted += usize::from(outcome.image_inserted);
            report.indexed += usize::from(outcome.indexed);
        }

        let now = chrono::Utc::now().timestamp().max(0);
        counter!("scrape_runs_total").increment(1);
        gauge!("scrape_last_run_ts").set(now as f64);
        tracing::info!(
            target: "scrape",
            items = report.items,
            fetched = report.fetched,
            eligible = report.eligible,
            stored = report.stored,
            indexed = report.indexed,
            "scrape run finished"
        );

        Ok(report)
    }
}
