//! In-memory [`ArchiveStore`] implementation for tests and fixtures.
//!
//! All tables sit behind one `RwLock`, so every operation (including a whole
//! `record_day`) is applied atomically with respect to other callers.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{ArchiveError, Result};
use crate::models::{Article, ArticleDetails, ArticleId, PositionRow, Resolved};

use super::ArchiveStore;

struct StoredPosition {
    article: ArticleId,
    captured_at: DateTime<Utc>,
    position: u32,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    articles: BTreeMap<ArticleId, Article>,
    by_link: HashMap<String, ArticleId>,
    positions: Vec<StoredPosition>,
    details: HashMap<ArticleId, ArticleDetails>,
}

/// In-memory store for tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored articles.
    pub fn article_count(&self) -> usize {
        self.read().map(|t| t.articles.len()).unwrap_or(0)
    }

    /// Number of stored positions.
    pub fn position_count(&self) -> usize {
        self.read().map(|t| t.positions.len()).unwrap_or(0)
    }

    /// Look up an article by handle.
    pub fn article(&self, id: ArticleId) -> Option<Article> {
        self.read().ok().and_then(|t| t.articles.get(&id).cloned())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned").into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned").into())
    }
}

#[async_trait]
impl ArchiveStore for InMemoryStore {
    async fn resolve_or_create(&self, link: &str, title: &str) -> Result<Resolved> {
        let mut tables = self.write()?;
        if let Some(id) = tables.by_link.get(link) {
            return Ok(Resolved {
                id: *id,
                created: false,
            });
        }

        tables.next_id += 1;
        let id = ArticleId(tables.next_id);
        tables.by_link.insert(link.to_string(), id);
        tables.articles.insert(
            id,
            Article {
                id,
                link: link.to_string(),
                title: title.to_string(),
            },
        );
        Ok(Resolved { id, created: true })
    }

    async fn record_day(&self, captured_at: DateTime<Utc>, articles: &[ArticleId]) -> Result<()> {
        if articles.is_empty() {
            return Err(ArchiveError::EmptyList);
        }

        let mut tables = self.write()?;

        // Check every row before inserting any of them.
        let mut seen = HashSet::new();
        for id in articles {
            if !tables.articles.contains_key(id) {
                return Err(ArchiveError::UnknownArticle(*id));
            }
            let exists = tables
                .positions
                .iter()
                .any(|p| p.article == *id && p.captured_at == captured_at);
            if exists || !seen.insert(*id) {
                return Err(ArchiveError::AlreadyRecorded { captured_at });
            }
        }

        for (i, id) in articles.iter().enumerate() {
            tables.positions.push(StoredPosition {
                article: *id,
                captured_at,
                position: i as u32 + 1,
            });
        }
        Ok(())
    }

    async fn attach_details(&self, article: ArticleId, details: &ArticleDetails) -> Result<()> {
        let mut tables = self.write()?;
        if !tables.articles.contains_key(&article) {
            return Err(ArchiveError::UnknownArticle(article));
        }
        if tables.details.contains_key(&article) {
            return Err(ArchiveError::DetailsExist(article));
        }
        tables.details.insert(article, details.clone());
        Ok(())
    }

    async fn articles_missing_details(&self) -> Result<Vec<Article>> {
        let tables = self.read()?;
        Ok(tables
            .articles
            .values()
            .filter(|a| !tables.details.contains_key(&a.id))
            .cloned()
            .collect())
    }

    async fn positions_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<PositionRow>> {
        let tables = self.read()?;
        let mut rows = Vec::new();
        for p in &tables.positions {
            if p.captured_at < from || p.captured_at >= until {
                continue;
            }
            let article = tables
                .articles
                .get(&p.article)
                .cloned()
                .ok_or_else(|| anyhow!("position references missing article {}", p.article))?;
            rows.push(PositionRow {
                article,
                details: tables.details.get(&p.article).cloned(),
                captured_at: p.captured_at,
                position: p.position,
            });
        }
        Ok(rows)
    }
}
