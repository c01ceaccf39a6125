// tests/metrics_http.rs
//
// Exercises the metrics router directly via tower::ServiceExt::oneshot.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use og_scraper::metrics::Metrics;
use og_scraper::store::memory::MemoryStore;
use og_scraper::{FetchResult, Item, PageFetcher, Scraper};
use std::sync::Arc;
use tower::ServiceExt as _;

const BODY_LIMIT: usize = 1024 * 1024;

struct FailingFetcher;

#[async_trait::async_trait]
impl PageFetcher for FailingFetcher {
    async fn fetch(&self, item: Item) -> FetchResult {
        FetchResult::empty(item)
    }
}

struct NoIndex;

#[async_trait::async_trait]
impl og_scraper::index::SearchIndex for NoIndex {
    async fn set_description(&self, _post_id: i64, _description: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn metrics_and_health_are_served() {
    let metrics = Metrics::init().expect("install recorder");

    let store = Arc::new(MemoryStore::with_items(vec![Item::new(1, "https://a.test/")]));
    Scraper::new(Arc::new(FailingFetcher), store, Arc::new(NoIndex))
        .run_once()
        .await
        .expect("run ok");

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .expect("oneshot /metrics");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("scrape_items_total"));
    assert!(text.contains("scrape_runs_total"));

    let resp = metrics
        .router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .expect("oneshot /health");
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}
