// src/store/mod.rs
pub mod memory;
pub mod mysql;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::scrape::types::Item;

/// Primary record store: selects recent posts and receives extracted previews.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Posts created within the trailing `window_minutes`.
    async fn recent_items(&self, window_minutes: u32) -> Result<Vec<Item>>;

    async fn update_post(
        &self,
        post_id: i64,
        description: &str,
        content: &str,
        modified: NaiveDateTime,
    ) -> Result<()>;

    /// Number of image records already attached to the post.
    async fn count_images(&self, post_id: i64) -> Result<i64>;

    async fn insert_image(&self, post_id: i64, external_url: &str) -> Result<()>;
}
