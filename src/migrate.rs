use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables and indexes. Safe to run repeatedly.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // Articles, keyed by link
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            link TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per article per capture; captured_at is UTC milliseconds
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS positions (
            article_id INTEGER NOT NULL,
            captured_at INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 1),
            UNIQUE(article_id, captured_at),
            FOREIGN KEY (article_id) REFERENCES articles(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS article_details (
            article_id INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            image_url TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (article_id) REFERENCES articles(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_positions_captured_at ON positions(captured_at)")
        .execute(pool)
        .await?;

    Ok(())
}
