// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::index::DEFAULT_INDEX_TIMEOUT;
use crate::scrape::fetch::{
    default_overrides, HostOverride, UserAgentTable, DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT,
};
use crate::scrape::scheduler::DEFAULT_INTERVAL;
use crate::scrape::ConcurrencyLimit;

pub const ENV_CONFIG_PATH: &str = "OG_SCRAPER_CONFIG";
pub const ENV_DB_PASS: &str = "OG_SCRAPER_DB_PASS";

const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_INTERVAL_SECS: u64 = DEFAULT_INTERVAL.as_secs();
const DEFAULT_WINDOW_MINUTES: u32 = 60;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = DEFAULT_FETCH_TIMEOUT.as_secs();
const DEFAULT_INDEX_TIMEOUT_SECS: u64 = DEFAULT_INDEX_TIMEOUT.as_secs();

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    /// Base URL of the search index core, e.g. `http://localhost:8983/solr/posts`.
    pub solr: String,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    /// Address for `/metrics` and `/health`; disabled when absent.
    #[serde(default)]
    pub metrics_bind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub user: String,
    /// "ENV" means: read from $OG_SCRAPER_DB_PASS
    #[serde(rename = "pass", default)]
    pub password: String,
    /// `host` or `host:port`
    pub server: String,
    #[serde(rename = "dbName", alias = "db_name")]
    pub db_name: String,
}

impl DbConfig {
    pub fn host_and_port(&self) -> Result<(String, u16)> {
        match self.server.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .with_context(|| format!("invalid port in db server {:?}", self.server))?;
                Ok((host.to_string(), port))
            }
            None => Ok((self.server.clone(), DEFAULT_MYSQL_PORT)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub interval_secs: u64,
    pub window_minutes: u32,
    pub fetch_timeout_secs: u64,
    pub index_timeout_secs: u64,
    /// Absent or 0: one fetch task per item.
    pub max_concurrency: Option<usize>,
    pub user_agent: String,
    pub user_agent_overrides: Vec<HostOverride>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            window_minutes: DEFAULT_WINDOW_MINUTES,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            index_timeout_secs: DEFAULT_INDEX_TIMEOUT_SECS,
            max_concurrency: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            user_agent_overrides: default_overrides(),
        }
    }
}

impl ScrapeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }

    pub fn concurrency(&self) -> ConcurrencyLimit {
        ConcurrencyLimit::from_option(self.max_concurrency)
    }

    pub fn user_agents(&self) -> UserAgentTable {
        UserAgentTable::new(self.user_agent.clone(), self.user_agent_overrides.clone())
    }

    fn sanitize(&mut self) {
        if self.interval_secs == 0 {
            self.interval_secs = DEFAULT_INTERVAL_SECS;
        }
        if self.window_minutes == 0 {
            self.window_minutes = DEFAULT_WINDOW_MINUTES;
        }
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = DEFAULT_FETCH_TIMEOUT_SECS;
        }
        if self.index_timeout_secs == 0 {
            self.index_timeout_secs = DEFAULT_INDEX_TIMEOUT_SECS;
        }
        if self.max_concurrency == Some(0) {
            self.max_concurrency = None;
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = DEFAULT_USER_AGENT.to_string();
        }
    }
}

impl AppConfig {
    /// Load from an explicit path. Supports JSON or TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::parse(&content, &ext)
            .with_context(|| format!("parsing config from {}", path.display()))
    }

    /// Load using env var + fallbacks:
    /// 1) $OG_SCRAPER_CONFIG
    /// 2) config/config.toml
    /// 3) config/config.json
    pub fn load_default() -> Result<Self> {
        Self::load_from(&Self::resolve_path()?)
    }

    pub fn resolve_path() -> Result<PathBuf> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Ok(pb);
            }
            bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
        }
        ["config/config.toml", "config/config.json"]
            .into_iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .ok_or_else(|| anyhow!("no config file found (config/config.toml or config/config.json)"))
    }

    pub fn parse(s: &str, hint_ext: &str) -> Result<Self> {
        let cfg: AppConfig = match hint_ext {
            "toml" => toml::from_str(s).context("invalid toml config")?,
            "json" => serde_json::from_str(s).context("invalid json config")?,
            _ => match serde_json::from_str(s) {
                Ok(cfg) => cfg,
                Err(_) => toml::from_str(s).context("config is neither json nor toml")?,
            },
        };
        cfg.finalize()
    }

    fn finalize(mut self) -> Result<Self> {
        if self.db.password.trim().eq_ignore_ascii_case("env") {
            self.db.password = std::env::var(ENV_DB_PASS)
                .map_err(|_| anyhow!("Missing {ENV_DB_PASS} env var"))?;
        }

        self.solr = self.solr.trim().trim_end_matches('/').to_string();
        if self.solr.is_empty() {
            bail!("config: `solr` must not be empty");
        }

        self.scrape.sanitize();
        Ok(self)
    }
}
