//! Ratings read path for the CLI and the HTTP server.
//!
//! Wraps [`pipeline::query_ratings`] in a [`RatingsPage`] that also carries
//! the previous/next dates a reader would navigate to.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;

use topten_core::error::ArchiveError;
use topten_core::models::ArticleRating;
use topten_core::pipeline;
use topten_core::store::ArchiveStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

pub const PAGE_TITLE: &str = "top 10 - archiv";

/// A rendered range of ratings plus navigation dates.
#[derive(Debug, Clone, Serialize)]
pub struct RatingsPage {
    pub title: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub prev_date: Option<NaiveDate>,
    pub next_date: Option<NaiveDate>,
    pub articles: Vec<ArticleRating>,
}

impl RatingsPage {
    pub fn new(from: NaiveDate, to: NaiveDate, articles: Vec<ArticleRating>) -> Self {
        Self {
            title: PAGE_TITLE.to_string(),
            from,
            to,
            prev_date: from.checked_sub_days(Days::new(1)),
            next_date: to.checked_add_days(Days::new(1)),
            articles,
        }
    }
}

/// Query `[from, to]` and wrap the results in a page.
pub async fn ratings_page(
    store: &dyn ArchiveStore,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<RatingsPage, ArchiveError> {
    let articles = pipeline::query_ratings(store, from, to).await?;
    Ok(RatingsPage::new(from, to, articles))
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", s))
}

/// Resolve CLI/query arguments into an inclusive range.
///
/// `date` selects one day; `from`/`to` select a range (a missing end
/// defaults to the other end). With nothing given, today in UTC.
pub fn resolve_range(
    date: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(NaiveDate, NaiveDate)> {
    if let Some(d) = date {
        let d = parse_date(d)?;
        return Ok((d, d));
    }
    match (from, to) {
        (Some(f), Some(t)) => Ok((parse_date(f)?, parse_date(t)?)),
        (Some(f), None) => {
            let f = parse_date(f)?;
            Ok((f, f))
        }
        (None, Some(t)) => {
            let t = parse_date(t)?;
            Ok((t, t))
        }
        (None, None) => {
            let today = Utc::now().date_naive();
            Ok((today, today))
        }
    }
}

/// CLI: `topten ratings`.
pub async fn run_ratings(
    config: &Config,
    date: Option<String>,
    from: Option<String>,
    to: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let (start, end) = resolve_range(date.as_deref(), from.as_deref(), to.as_deref())?;

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let mut page = ratings_page(&store, start, end).await?;
    pool.close().await;

    if let Some(limit) = limit {
        page.articles.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    println!("{} ({} .. {})", page.title, page.from, page.to);
    if page.articles.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!(
        "{:>4} {:>8} {:>5} {:>5}  {}",
        "#", "RATING", "BEST", "DAYS", "TITLE"
    );
    for (i, r) in page.articles.iter().enumerate() {
        println!(
            "{:>4} {:>8.3} {:>5} {:>5}  {}",
            i + 1,
            r.rating,
            r.best_position,
            r.days,
            r.article.title
        );
        println!("{:>26}{}", "", r.article.link);
    }
    Ok(())
}
