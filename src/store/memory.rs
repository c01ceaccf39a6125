// src/store/memory.rs
//! In-memory `PostStore` for tests and dry runs.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::scrape::types::Item;
use crate::store::PostStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostRow {
    pub description: String,
    pub content: String,
    pub modified: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
struct State {
    items: Vec<Item>,
    posts: HashMap<i64, PostRow>,
    images: Vec<(i64, String)>,
    last_window: Option<u32>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_updates: bool,
    fail_image_counts: bool,
}

impl MemoryStore {
    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            state: Mutex::new(State {
                items,
                ..State::default()
            }),
            ..Self::default()
        }
    }

    /// Every `update_post` call errors; image and index paths stay usable.
    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    /// Every `count_images` call errors after the record update has landed.
    pub fn failing_image_counts(mut self) -> Self {
        self.fail_image_counts = true;
        self
    }

    /// A panic while holding the lock leaves plain data behind; keep using it.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn post(&self, post_id: i64) -> Option<PostRow> {
        self.state().posts.get(&post_id).cloned()
    }

    pub fn images(&self) -> Vec<(i64, String)> {
        self.state().images.clone()
    }

    pub fn last_window(&self) -> Option<u32> {
        self.state().last_window
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn recent_items(&self, window_minutes: u32) -> Result<Vec<Item>> {
        let mut st = self.state();
        st.last_window = Some(window_minutes);
        Ok(st.items.clone())
    }

    async fn update_post(
        &self,
        post_id: i64,
        description: &str,
        content: &str,
        modified: NaiveDateTime,
    ) -> Result<()> {
        if self.fail_updates {
            return Err(anyhow!("update rejected for post {post_id}"));
        }
        let mut st = self.state();
        st.posts.insert(
            post_id,
            PostRow {
                description: description.to_string(),
                content: content.to_string(),
                modified: Some(modified),
            },
        );
        Ok(())
    }

    async fn count_images(&self, post_id: i64) -> Result<i64> {
        if self.fail_image_counts {
            return Err(anyhow!("image count unavailable for post {post_id}"));
        }
        let st = self.state();
        Ok(st.images.iter().filter(|(id, _)| *id == post_id).count() as i64)
    }

    async fn insert_image(&self, post_id: i64, external_url: &str) -> Result<()> {
        let mut st = self.state();
        st.images.push((post_id, external_url.to_string()));
        Ok(())
    }
}
