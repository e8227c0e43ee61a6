//! Daily ingestion and range queries over an [`ArchiveStore`].
//!
//! Ingestion validates the whole list before any store call, resolves each
//! entry in order, then records the day as a single unit. Queries convert
//! an inclusive UTC date range into a half-open timestamp window and hand the
//! rows to [`rating::aggregate`].

use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info};

use crate::error::{ArchiveError, Result};
use crate::models::{ArticleRating, IngestReport, ListEntry};
use crate::rating;
use crate::source::RankingSource;
use crate::store::ArchiveStore;

/// Reject a list that must not reach the store.
///
/// `expected_len` of `None` disables the length check; an empty list is
/// always rejected, as is a list naming the same link twice.
pub fn validate_entries(entries: &[ListEntry], expected_len: Option<usize>) -> Result<()> {
    if let Some(expected) = expected_len {
        if entries.len() != expected {
            return Err(ArchiveError::UnexpectedListLength {
                expected,
                actual: entries.len(),
            });
        }
    }
    if entries.is_empty() {
        return Err(ArchiveError::EmptyList);
    }
    if let Some(i) = entries.iter().position(|e| e.link.is_empty()) {
        return Err(ArchiveError::EmptyIdentityKey { position: i + 1 });
    }
    let mut seen = HashMap::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        if let Some(first) = seen.insert(entry.link.as_str(), i + 1) {
            return Err(ArchiveError::DuplicateIdentityKey {
                position: i + 1,
                first,
            });
        }
    }
    Ok(())
}

/// Ingest one capture: resolve every entry, then record all positions.
pub async fn ingest_day(
    store: &dyn ArchiveStore,
    captured_at: DateTime<Utc>,
    entries: &[ListEntry],
    expected_len: Option<usize>,
) -> Result<IngestReport> {
    validate_entries(entries, expected_len)?;

    let mut articles = Vec::with_capacity(entries.len());
    let mut new_articles = 0usize;
    for entry in entries {
        let resolved = store.resolve_or_create(&entry.link, &entry.title).await?;
        if resolved.created {
            debug!(id = %resolved.id, link = %entry.link, "created article");
            new_articles += 1;
        }
        articles.push(resolved.id);
    }

    store.record_day(captured_at, &articles).await?;
    info!(
        %captured_at,
        positions = articles.len(),
        new_articles,
        "recorded ranking"
    );

    Ok(IngestReport {
        captured_at,
        articles,
        new_articles,
    })
}

/// Fetch the current ranking from `source` and ingest it.
///
/// A fetch failure aborts before the store is touched.
pub async fn fetch_and_ingest(
    source: &dyn RankingSource,
    store: &dyn ArchiveStore,
    captured_at: DateTime<Utc>,
    expected_len: Option<usize>,
) -> Result<IngestReport> {
    let entries = source
        .fetch_ranking()
        .await
        .map_err(ArchiveError::Source)?;
    ingest_day(store, captured_at, &entries, expected_len).await
}

/// Ratings for every article captured between `start` and `end` inclusive
/// (UTC calendar dates), best first.
pub async fn query_ratings(
    store: &dyn ArchiveStore,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ArticleRating>> {
    if start > end {
        return Err(ArchiveError::InvalidRange { start, end });
    }
    let (from, until) = day_window(start, end);
    let rows = store.positions_between(from, until).await?;
    debug!(%start, %end, rows = rows.len(), "aggregating positions");
    Ok(rating::aggregate(rows))
}

/// Half-open UTC window `[start 00:00, end + 1 day 00:00)`.
pub fn day_window(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = start.and_time(NaiveTime::MIN).and_utc();
    let until = end
        .checked_add_days(Days::new(1))
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (from, until)
}
