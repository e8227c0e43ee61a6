//! Storage abstraction for the archive.
//!
//! [`ArchiveStore`] bundles the three write-side components (article
//! registry, ranking recorder, detail enricher) with the single read query
//! the aggregation needs. Backends must enforce the uniqueness invariants
//! atomically:
//!
//! - one article per link;
//! - one position per `(article, captured_at)`;
//! - one details record per article.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Article, ArticleDetails, ArticleId, PositionRow, Resolved};

/// Abstract storage backend for the archive.
///
/// | Method | Component |
/// |--------|-----------|
/// | [`resolve_or_create`](ArchiveStore::resolve_or_create) | article registry |
/// | [`record_day`](ArchiveStore::record_day) | ranking recorder |
/// | [`attach_details`](ArchiveStore::attach_details) | detail enricher |
/// | [`articles_missing_details`](ArchiveStore::articles_missing_details) | detail enricher |
/// | [`positions_between`](ArchiveStore::positions_between) | aggregation read path |
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Look up an article by link, creating it with `title` if absent.
    ///
    /// An existing article keeps its first-seen title.
    async fn resolve_or_create(&self, link: &str, title: &str) -> Result<Resolved>;

    /// Record `articles[i]` at rank `i + 1` for `captured_at`, all or nothing.
    ///
    /// Fails with [`AlreadyRecorded`](crate::ArchiveError::AlreadyRecorded)
    /// if any `(article, captured_at)` pair already exists, and with
    /// [`UnknownArticle`](crate::ArchiveError::UnknownArticle) for a handle
    /// the store never issued. Nothing is written in either case.
    async fn record_day(&self, captured_at: DateTime<Utc>, articles: &[ArticleId]) -> Result<()>;

    /// Attach details to an article. A second call for the same article fails
    /// with [`DetailsExist`](crate::ArchiveError::DetailsExist).
    async fn attach_details(&self, article: ArticleId, details: &ArticleDetails) -> Result<()>;

    /// All articles without details, ascending by handle.
    async fn articles_missing_details(&self) -> Result<Vec<Article>>;

    /// Every position captured in `[from, until)`, joined with its article and
    /// details. Row order is unspecified.
    async fn positions_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<PositionRow>>;
}
