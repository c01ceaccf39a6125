// src/index.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_INDEX_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Replaces the indexed description of one post.
    async fn set_description(&self, post_id: i64, description: &str) -> Result<()>;
}

/// Atomic-update wrapper: `{"set": ..}` replaces the field value.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SetField<'a> {
    pub set: &'a str,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DescriptionUpdate<'a> {
    pub id: i64,
    pub post_description: SetField<'a>,
}

/// Solr core reached over its JSON update handler, committing on every call.
#[derive(Clone)]
pub struct SolrIndex {
    update_url: String,
    client: Client,
    timeout: Duration,
}

impl SolrIndex {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("building search index http client")?;
        Ok(Self {
            update_url: format!("{}/update?commit=true", base_url.trim_end_matches('/')),
            client,
            timeout,
        })
    }

    pub fn update_url(&self) -> &str {
        &self.update_url
    }
}

#[async_trait]
impl SearchIndex for SolrIndex {
    async fn set_description(&self, post_id: i64, description: &str) -> Result<()> {
        let docs = [DescriptionUpdate {
            id: post_id,
            post_description: SetField { set: description },
        }];

        let rsp = self
            .client
            .post(&self.update_url)
            .timeout(self.timeout)
            .json(&docs)
            .send()
            .await
            .context("search index update request failed")?;

        if let Err(e) = rsp.error_for_status_ref() {
            return Err(anyhow!("search index HTTP error: {e}"));
        }
        Ok(())
    }
}
