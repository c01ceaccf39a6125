// src/bootstrap.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::index::SolrIndex;
use crate::scrape::fetch::HttpFetcher;
use crate::scrape::{RunReport, Scraper};
use crate::store::mysql::MySqlPostStore;

/// Long-lived collaborators shared by every run. The database connection is
/// not one of them: each run opens and closes its own pool.
pub struct ScrapeRuntime {
    pub cfg: AppConfig,
    fetcher: Arc<HttpFetcher>,
    index: Arc<SolrIndex>,
}

impl ScrapeRuntime {
    pub fn new(cfg: AppConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(cfg.scrape.user_agents(), cfg.scrape.fetch_timeout())?;
        let index = SolrIndex::new(&cfg.solr, cfg.scrape.index_timeout())?;
        info!(
            solr = %cfg.solr,
            db_server = %cfg.db.server,
            window_minutes = cfg.scrape.window_minutes,
            "scrape runtime configured"
        );
        Ok(Self {
            cfg,
            fetcher: Arc::new(fetcher),
            index: Arc::new(index),
        })
    }

    /// One full cycle: connect, scrape, disconnect. Any `Err` aborts only this run.
    pub async fn run_cycle(&self) -> Result<RunReport> {
        let store = Arc::new(
            MySqlPostStore::connect(&self.cfg.db)
                .await
                .context("connecting to primary store")?,
        );

        let scraper = Scraper::new(self.fetcher.clone(), store.clone(), self.index.clone())
            .with_window_minutes(self.cfg.scrape.window_minutes)
            .with_concurrency(self.cfg.scrape.concurrency());

        let report = scraper.run_once().await;
        store.close().await;
        report
    }
}
