// tests/scheduler.rs
use og_scraper::scrape::scheduler::spawn_scheduler;
use og_scraper::RunReport;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn runs_immediately_and_keeps_going_after_errors() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let handle = spawn_scheduler(Duration::from_millis(40), move || {
        let n = c.fetch_add(1, Ordering::SeqCst);
        async move {
            if n % 2 == 0 {
                Err(anyhow::anyhow!("store unreachable"))
            } else {
                Ok(RunReport::default())
            }
        }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1, "first run starts at once");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(calls.load(Ordering::SeqCst) >= 3);
    assert!(!handle.is_finished());
    handle.abort();
}
