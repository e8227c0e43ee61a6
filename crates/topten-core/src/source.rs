//! External collaborator traits.
//!
//! A [`RankingSource`] supplies one capture's ordered `(link, title)` list;
//! a [`DetailSource`] supplies metadata for a single article. Network and
//! parsing concerns live in the implementations, not in the core.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Article, ArticleDetails, ListEntry};

#[async_trait]
pub trait RankingSource: Send + Sync {
    /// Fetch the current ranking in list order (rank 1 first).
    async fn fetch_ranking(&self) -> Result<Vec<ListEntry>>;
}

#[async_trait]
pub trait DetailSource: Send + Sync {
    /// Fetch metadata for one article. Missing fields are returned empty.
    async fn fetch_details(&self, article: &Article) -> Result<ArticleDetails>;
}
