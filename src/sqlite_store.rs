//! SQLite-backed [`WikiStore`] implementation.
//!
//! The pool is opened lazily on first use. A missing or unopenable
//! database is reported as an error on every query until it becomes
//! available, so a wiki rebuilt while the process runs is picked up
//! without a restart.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use tokio::sync::OnceCell;

use crate::db;
use crate::models::WikiEntry;
use crate::store::WikiStore;

/// SQLite implementation of the [`WikiStore`] trait.
pub struct SqliteWikiStore {
    db_path: PathBuf,
    pool: OnceCell<SqlitePool>,
}

impl SqliteWikiStore {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            pool: OnceCell::new(),
        }
    }

    async fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .get_or_try_init(|| db::open_existing(&self.db_path))
            .await
    }

    /// Insert or update an article, keyed by title.
    ///
    /// Used by the corpus builder and by tests; never called at query time.
    pub async fn upsert_entry(&self, entry: &WikiEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wiki (category, title, url, keywords, content)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(title) DO UPDATE SET
                category = excluded.category,
                url = excluded.url,
                keywords = excluded.keywords,
                content = excluded.content
            "#,
        )
        .bind(&entry.category)
        .bind(&entry.title)
        .bind(&entry.url)
        .bind(&entry.keywords)
        .bind(&entry.content)
        .execute(self.pool().await?)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WikiStore for SqliteWikiStore {
    async fn entries(&self) -> Result<Vec<WikiEntry>> {
        let rows = sqlx::query(
            "SELECT title, category, url, keywords, content FROM wiki ORDER BY id ASC",
        )
        .fetch_all(self.pool().await?)
        .await?;

        Ok(rows
            .iter()
            .map(|row| WikiEntry {
                title: row.get("title"),
                category: row.get("category"),
                url: row.get("url"),
                keywords: row.get("keywords"),
                content: row.get("content"),
            })
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wiki")
            .fetch_one(self.pool().await?)
            .await?;
        Ok(count)
    }
}
