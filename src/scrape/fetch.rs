// src/scrape/fetch.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{header::USER_AGENT, Client, Url};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::scrape::types::{FetchResult, Item, PageFetcher};

pub const DEFAULT_USER_AGENT: &str = "og-scraper/0.1 (+preview metadata refresher)";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Hosts that must see a different requester identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOverride {
    /// Matches the host itself and any subdomain of it.
    pub host_suffix: String,
    pub user_agent: String,
}

/// Default User-Agent plus per-host-suffix exceptions. First matching override wins.
#[derive(Debug, Clone)]
pub struct UserAgentTable {
    default: String,
    overrides: Vec<HostOverride>,
}

impl UserAgentTable {
    pub fn new(default: impl Into<String>, overrides: Vec<HostOverride>) -> Self {
        let overrides = overrides
            .into_iter()
            .map(|o| HostOverride {
                host_suffix: o.host_suffix.trim().trim_start_matches('.').to_ascii_lowercase(),
                user_agent: o.user_agent,
            })
            .filter(|o| !o.host_suffix.is_empty())
            .collect();
        Self {
            default: default.into(),
            overrides,
        }
    }

    pub fn resolve(&self, host: Option<&str>) -> &str {
        let Some(host) = host else {
            return &self.default;
        };
        let host = host.to_ascii_lowercase();
        self.overrides
            .iter()
            .find(|o| host_matches(&host, &o.host_suffix))
            .map(|o| o.user_agent.as_str())
            .unwrap_or(self.default.as_str())
    }
}

impl Default for UserAgentTable {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT, default_overrides())
    }
}

/// Consent walls on this host only let crawler identities through.
pub fn default_overrides() -> Vec<HostOverride> {
    vec![HostOverride {
        host_suffix: "tumblr.com".to_string(),
        user_agent: "Baiduspider".to_string(),
    }]
}

fn host_matches(host: &str, suffix: &str) -> bool {
    host == suffix
        || host
            .strip_suffix(suffix)
            .is_some_and(|head| head.ends_with('.'))
}

/// Plain GET with a whole-request deadline. Never retries.
pub struct HttpFetcher {
    client: Client,
    agents: UserAgentTable,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(agents: UserAgentTable, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("building page fetch http client")?;
        Ok(Self {
            client,
            agents,
            timeout,
        })
    }

    async fn fetch_body(&self, url: &str) -> Result<String> {
        let url = Url::parse(url).context("parsing item url")?;
        let agent = self.agents.resolve(url.host_str());

        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, agent)
            .timeout(self.timeout)
            .send()
            .await
            .context("page http get()")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("unexpected status {status}");
        }
        resp.text().await.context("page http .text()")
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, item: Item) -> FetchResult {
        tracing::debug!(target: "scrape", item_id = item.id, url = %item.url, "fetching");
        let t0 = Instant::now();
        let outcome = self.fetch_body(&item.url).await;
        histogram!("scrape_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match outcome {
            Ok(body) => FetchResult { item, body },
            Err(e) => {
                tracing::warn!(target: "scrape", error = ?e, item_id = item.id, url = %item.url, "fetch failed");
                counter!("scrape_fetch_failures_total").increment(1);
                FetchResult::empty(item)
            }
        }
    }
}
