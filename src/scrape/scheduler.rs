// src/scrape/scheduler.rs
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::scrape::RunReport;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(7 * 60);

/// Runs `job` now and then once per `interval`. A failed run is logged here
/// and the loop waits for the next tick.
pub fn spawn_scheduler<F, Fut>(interval: Duration, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<RunReport>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(target: "scrape", interval_secs = interval.as_secs(), "scheduler started");
        loop {
            ticker.tick().await;
            match job().await {
                Ok(report) => tracing::debug!(target: "scrape", ?report, "scheduled run ok"),
                Err(e) => tracing::error!(target: "scrape", error = ?e, "scheduled run aborted"),
            }
        }
    })
}
