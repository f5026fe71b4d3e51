use anyhow::Result;
use std::path::Path;

use crate::db;

/// Create the wiki schema. Idempotent.
///
/// The corpus builder fills this table; the title is the natural key.
pub async fn run_migrations(db_path: &Path) -> Result<()> {
    let pool = db::connect(db_path).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS wiki (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL DEFAULT '',
            title TEXT NOT NULL UNIQUE,
            url TEXT NOT NULL DEFAULT '',
            keywords TEXT NOT NULL DEFAULT '',
            content TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_wiki_category ON wiki(category)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
