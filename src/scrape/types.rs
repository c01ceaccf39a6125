// src/scrape/types.rs
use async_trait::async_trait;

/// A post selected for scraping: its primary key and external link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    pub id: i64,
    pub url: String,
}

impl Item {
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }
}

/// Outcome of one page fetch. An empty `body` is the only failure signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub item: Item,
    pub body: String,
}

impl FetchResult {
    pub fn empty(item: Item) -> Self {
        Self {
            item,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        !self.body.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewMetadata {
    pub description: String,
    pub featured_image: String,
}

impl PreviewMetadata {
    /// Both fields present: the eligibility gate for persistence.
    pub fn is_complete(&self) -> bool {
        !self.description.is_empty() && !self.featured_image.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedItem {
    pub item: Item,
    pub body: String,
    pub metadata: PreviewMetadata,
}

impl ScrapedItem {
    /// Runs the extractor over the fetched body.
    pub fn from_fetch(result: FetchResult) -> Self {
        let metadata = crate::scrape::extract::extract_preview(&result.body);
        Self {
            item: result.item,
            body: result.body,
            metadata,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.metadata.is_complete()
    }
}

/// Fetches the page behind an item. Implementations never fail: every error
/// path yields a `FetchResult` with an empty body.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, item: Item) -> FetchResult;
}
