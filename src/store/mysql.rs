// src/store/mysql.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;

use crate::config::DbConfig;
use crate::scrape::types::Item;
use crate::store::PostStore;

pub struct MySqlPostStore {
    pool: MySqlPool,
}

impl MySqlPostStore {
    /// Opens a small pool and pings the server before handing it out.
    pub async fn connect(cfg: &DbConfig) -> Result<Self> {
        let (host, port) = cfg.host_and_port()?;
        let opts = MySqlConnectOptions::new()
            .host(&host)
            .port(port)
            .username(&cfg.user)
            .password(&cfg.password)
            .database(&cfg.db_name)
            .charset("utf8mb4");

        let pool = MySqlPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(opts)
            .await
            .with_context(|| format!("opening mysql pool to {}", cfg.server))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .context("pinging mysql")?;

        tracing::info!(server = %cfg.server, db = %cfg.db_name, "opened database connection");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("closed database connection");
    }
}

#[async_trait]
impl PostStore for MySqlPostStore {
    async fn recent_items(&self, window_minutes: u32) -> Result<Vec<Item>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT CAST(pk_post_id AS SIGNED), link FROM posts \
             WHERE created > (NOW() - INTERVAL ? MINUTE)",
        )
        .bind(window_minutes)
        .fetch_all(&self.pool)
        .await
        .context("selecting recent posts")?;

        Ok(rows
            .into_iter()
            .map(|(id, url)| Item { id, url })
            .collect())
    }

    async fn update_post(
        &self,
        post_id: i64,
        description: &str,
        content: &str,
        modified: NaiveDateTime,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE posts SET description = ?, modified = ?, content = ? WHERE pk_post_id = ?",
        )
        .bind(description)
        .bind(modified)
        .bind(content)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .context("updating post preview")?;
        Ok(())
    }

    async fn count_images(&self, post_id: i64) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE fk_post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .context("counting post images")?;
        Ok(n)
    }

    async fn insert_image(&self, post_id: i64, external_url: &str) -> Result<()> {
        sqlx::query("INSERT INTO files (fk_post_id, external_url) VALUES (?, ?)")
            .bind(post_id)
            .bind(external_url)
            .execute(&self.pool)
            .await
            .context("inserting post image")?;
        Ok(())
    }
}
