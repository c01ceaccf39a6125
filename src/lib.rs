// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod bootstrap;
pub mod config;
pub mod index;
pub mod metrics;
pub mod scrape;
pub mod store;
pub mod update;

// ---- Re-exports for stable public API ----
pub use crate::bootstrap::ScrapeRuntime;
pub use crate::config::AppConfig;
pub use crate::scrape::extract::extract_preview;
pub use crate::scrape::types::{FetchResult, Item, PageFetcher, PreviewMetadata, ScrapedItem};
pub use crate::scrape::{fetch_all, ConcurrencyLimit, RunReport, Scraper};
