//! Data types that flow through ingestion and aggregation.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stable numeric handle of an article, assigned once by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `(link, title)` pair exactly as scraped, in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub link: String,
    pub title: String,
}

impl ListEntry {
    pub fn new(link: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
        }
    }
}

/// A known article. `link` is the identity key, compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub id: ArticleId,
    pub link: String,
    pub title: String,
}

/// Optional descriptive metadata attached to an article at most once.
///
/// Fields missing on the article page are stored as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleDetails {
    pub description: String,
    pub image_url: String,
}

/// Outcome of resolving an identity key against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub id: ArticleId,
    /// `true` when this call created the article.
    pub created: bool,
}

/// A stored position joined with its article and optional details.
///
/// This is the read-path row the aggregation consumes.
#[derive(Debug, Clone)]
pub struct PositionRow {
    pub article: Article,
    pub details: Option<ArticleDetails>,
    pub captured_at: DateTime<Utc>,
    /// 1-based rank within the capture.
    pub position: u32,
}

impl PositionRow {
    /// UTC calendar date of the capture.
    pub fn capture_date(&self) -> NaiveDate {
        self.captured_at.date_naive()
    }
}

/// Aggregated standing of one article over a date range. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleRating {
    pub article: Article,
    pub details: Option<ArticleDetails>,
    /// Best (lowest-numbered) rank reached anywhere in the range.
    pub best_position: u32,
    /// Sum of per-day decay weights.
    pub rating: f64,
    /// Number of distinct capture dates the article appeared on.
    pub days: u32,
}

/// Summary of one successful day ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub captured_at: DateTime<Utc>,
    /// Handles in rank order; index 0 is rank 1.
    pub articles: Vec<ArticleId>,
    pub new_articles: usize,
}
