//! Decayed, position-weighted rating over a set of captures.
//!
//! # Algorithm
//!
//! 1. Reduce rows to one best (minimum) position per `(article, capture date)`.
//! 2. Per article, sum [`decay_weight`] over those per-day positions and keep
//!    the overall best position.
//! 3. Sort by rating descending, then article handle ascending.
//!
//! Articles absent on a day contribute nothing for that day. The weight is
//! `1 / 2^(position - 1)`: rank 1 → 1.0, rank 2 → 0.5, rank 3 → 0.25, …

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::models::{ArticleId, ArticleRating, PositionRow};

/// Contribution of a single day's position to the rating.
///
/// Strictly decreasing in `position`. Position 0 is treated as 1.
pub fn decay_weight(position: u32) -> f64 {
    let exponent = position.saturating_sub(1).min(i32::MAX as u32) as i32;
    0.5f64.powi(exponent)
}

/// Aggregate position rows into ratings ordered best first.
///
/// An empty input yields an empty output.
pub fn aggregate(rows: Vec<PositionRow>) -> Vec<ArticleRating> {
    // (article, date) -> best position that day
    let mut per_day: BTreeMap<(ArticleId, NaiveDate), u32> = BTreeMap::new();
    let mut by_article: HashMap<ArticleId, ArticleRating> = HashMap::new();

    for row in rows {
        let key = (row.article.id, row.capture_date());
        per_day
            .entry(key)
            .and_modify(|best| *best = (*best).min(row.position))
            .or_insert(row.position);

        by_article
            .entry(row.article.id)
            .or_insert_with(|| ArticleRating {
                article: row.article,
                details: row.details,
                best_position: row.position,
                rating: 0.0,
                days: 0,
            });
    }

    for ((id, _date), position) in per_day {
        if let Some(entry) = by_article.get_mut(&id) {
            entry.rating += decay_weight(position);
            entry.best_position = entry.best_position.min(position);
            entry.days += 1;
        }
    }

    let mut results: Vec<ArticleRating> = by_article.into_values().collect();
    results.sort_by(compare_ratings);
    results
}

/// Rating descending, ties broken by ascending article handle.
fn compare_ratings(a: &ArticleRating, b: &ArticleRating) -> Ordering {
    b.rating
        .partial_cmp(&a.rating)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.article.id.cmp(&b.article.id))
}
