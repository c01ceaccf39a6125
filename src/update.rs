// src/update.rs
//! Writes an eligible scrape into the primary store and the search index.
//!
//! Both side effects are best-effort and attempted exactly once. A failed record
//! update skips the image step but never the index step. An image-step failure
//! leaves the record counted as stored.

use chrono::{SubsecRound, Utc};
use metrics::counter;
use tracing::{info, warn};

use crate::index::SearchIndex;
use crate::scrape::types::ScrapedItem;
use crate::store::PostStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub stored: bool,
    pub image_inserted: bool,
    pub indexed: bool,
}

pub async fn apply(
    store: &dyn PostStore,
    index: &dyn SearchIndex,
    scraped: &ScrapedItem,
) -> UpdateOutcome {
    let mut outcome = UpdateOutcome::default();
    let post_id = scraped.item.id;
    let url = scraped.item.url.as_str();

    info!(target: "scrape", post_id, url, "updating preview metadata");

    match write_record(store, scraped).await {
        Ok(()) => {
            outcome.stored = true;
            match ensure_image(store, scraped).await {
                Ok(inserted) => outcome.image_inserted = inserted,
                Err(e) => {
                    warn!(target: "scrape", error = ?e, post_id, url, "image record step failed");
                    counter!("scrape_image_errors_total").increment(1);
                }
            }
        }
        Err(e) => {
            warn!(target: "scrape", error = ?e, post_id, url, "primary store update failed");
            counter!("scrape_store_errors_total").increment(1);
        }
    }

    match index
        .set_description(post_id, &scraped.metadata.description)
        .await
    {
        Ok(()) => outcome.indexed = true,
        Err(e) => {
            warn!(target: "scrape", error = ?e, post_id, url, "search index update failed");
            counter!("scrape_index_errors_total").increment(1);
        }
    }

    outcome
}

async fn write_record(store: &dyn PostStore, scraped: &ScrapedItem) -> anyhow::Result<()> {
    let modified = Utc::now().trunc_subsecs(0).naive_utc();
    store
        .update_post(
            scraped.item.id,
            &scraped.metadata.description,
            &scraped.body,
            modified,
        )
        .await
}

/// Returns whether a new image record was written.
async fn ensure_image(store: &dyn PostStore, scraped: &ScrapedItem) -> anyhow::Result<bool> {
    let post_id = scraped.item.id;
    if store.count_images(post_id).await? > 0 {
        return Ok(false);
    }
    store
        .insert_image(post_id, &scraped.metadata.featured_image)
        .await?;
    counter!("scrape_images_inserted_total").increment(1);
    Ok(true)
}
