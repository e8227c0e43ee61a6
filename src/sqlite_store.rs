//! SQLite-backed [`ArchiveStore`] implementation.
//!
//! Uniqueness is enforced by the schema (see [`crate::migrate`]); this module
//! turns constraint violations into the matching [`ArchiveError`] variants so
//! callers can tell a re-run from a real failure. A day's positions are
//! written inside one transaction that rolls back on the first error.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use topten_core::error::{ArchiveError, Result};
use topten_core::models::{Article, ArticleDetails, ArticleId, PositionRow, Resolved};
use topten_core::store::ArchiveStore;

/// SQLite implementation of the [`ArchiveStore`] trait.
///
/// Cheap to clone; clones share the underlying pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn storage(err: sqlx::Error) -> ArchiveError {
    ArchiveError::Storage(err.into())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_foreign_key_violation())
}

#[async_trait]
impl ArchiveStore for SqliteStore {
    async fn resolve_or_create(&self, link: &str, title: &str) -> Result<Resolved> {
        let now = Utc::now().timestamp();

        // First-seen title wins: an existing link is left untouched.
        let inserted = sqlx::query(
            "INSERT INTO articles (link, title, created_at) VALUES (?, ?, ?) ON CONFLICT(link) DO NOTHING",
        )
        .bind(link)
        .bind(title)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM articles WHERE link = ?")
            .bind(link)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;

        Ok(Resolved {
            id: ArticleId(id),
            created: inserted.rows_affected() == 1,
        })
    }

    async fn record_day(&self, captured_at: DateTime<Utc>, articles: &[ArticleId]) -> Result<()> {
        if articles.is_empty() {
            return Err(ArchiveError::EmptyList);
        }

        let ts = captured_at.timestamp_millis();
        let mut tx = self.pool.begin().await.map_err(storage)?;

        for (i, id) in articles.iter().enumerate() {
            let result = sqlx::query(
                "INSERT INTO positions (article_id, captured_at, position) VALUES (?, ?, ?)",
            )
            .bind(id.0)
            .bind(ts)
            .bind(i as i64 + 1)
            .execute(&mut *tx)
            .await;

            // Returning drops `tx`, which rolls back every earlier insert.
            match result {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(ArchiveError::AlreadyRecorded { captured_at })
                }
                Err(e) if is_foreign_key_violation(&e) => {
                    return Err(ArchiveError::UnknownArticle(*id))
                }
                Err(e) => return Err(storage(e)),
            }
        }

        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn attach_details(&self, article: ArticleId, details: &ArticleDetails) -> Result<()> {
        let now = Utc::now().timestamp();
        let result = sqlx::query(
            "INSERT INTO article_details (article_id, description, image_url, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(article.0)
        .bind(&details.description)
        .bind(&details.image_url)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(ArchiveError::DetailsExist(article)),
            Err(e) if is_foreign_key_violation(&e) => Err(ArchiveError::UnknownArticle(article)),
            Err(e) => Err(storage(e)),
        }
    }

    async fn articles_missing_details(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.link, a.title
            FROM articles a
            LEFT JOIN article_details d ON d.article_id = a.id
            WHERE d.article_id IS NULL
            ORDER BY a.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows
            .iter()
            .map(|row| Article {
                id: ArticleId(row.get("id")),
                link: row.get("link"),
                title: row.get("title"),
            })
            .collect())
    }

    async fn positions_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<PositionRow>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.link, a.title, p.captured_at, p.position,
                   d.description, d.image_url
            FROM positions p
            JOIN articles a ON a.id = p.article_id
            LEFT JOIN article_details d ON d.article_id = a.id
            WHERE p.captured_at >= ? AND p.captured_at < ?
            "#,
        )
        .bind(from.timestamp_millis())
        .bind(until.timestamp_millis())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let captured_ms: i64 = row.get("captured_at");
            let captured_at = DateTime::from_timestamp_millis(captured_ms)
                .ok_or_else(|| anyhow!("captured_at out of range: {}", captured_ms))?;
            let position: i64 = row.get("position");
            let position = u32::try_from(position)
                .map_err(|_| anyhow!("position out of range: {}", position))?;

            let description: Option<String> = row.get("description");
            let image_url: Option<String> = row.get("image_url");

            out.push(PositionRow {
                article: Article {
                    id: ArticleId(row.get("id")),
                    link: row.get("link"),
                    title: row.get("title"),
                },
                details: description.map(|description| ArticleDetails {
                    description,
                    image_url: image_url.unwrap_or_default(),
                }),
                captured_at,
                position,
            });
        }
        Ok(out)
    }
}
