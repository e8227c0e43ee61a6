//! Detail backfill: attach `og:` metadata to articles that lack it.
//!
//! Fetches run with bounded concurrency. A failed fetch is logged and
//! counted without stopping the others; an article that gained details in
//! the meantime is counted as skipped. Storage failures abort the run.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use topten_core::source::DetailSource;
use topten_core::store::ArchiveStore;

use crate::config::Config;
use crate::db;
use crate::scrape::WebDetailSource;
use crate::sqlite_store::SqliteStore;

/// Counts from one backfill run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillSummary {
    pub pending: usize,
    pub attached: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BackfillSummary {
    pub fn print(&self) {
        println!("details pending");
        println!("  pending: {}", self.pending);
        println!("  attached: {}", self.attached);
        println!("  skipped: {}", self.skipped);
        println!("  failed: {}", self.failed);
    }
}

/// Enrich up to `limit` articles missing details, `concurrency` at a time.
pub async fn backfill_details(
    store: &dyn ArchiveStore,
    source: &dyn DetailSource,
    limit: usize,
    concurrency: usize,
) -> Result<BackfillSummary> {
    let mut pending = store.articles_missing_details().await?;
    pending.truncate(limit);

    let mut summary = BackfillSummary {
        pending: pending.len(),
        ..Default::default()
    };
    if pending.is_empty() {
        return Ok(summary);
    }

    let mut fetched = stream::iter(pending)
        .map(|article| async move {
            let result = source.fetch_details(&article).await;
            (article, result)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((article, result)) = fetched.next().await {
        let details = match result {
            Ok(d) => d,
            Err(e) => {
                warn!(id = %article.id, link = %article.link, error = %e, "could not fetch article details");
                summary.failed += 1;
                continue;
            }
        };

        match store.attach_details(article.id, &details).await {
            Ok(()) => {
                debug!(id = %article.id, "attached details");
                summary.attached += 1;
            }
            Err(e) if e.is_conflict() => {
                debug!(id = %article.id, "details already attached");
                summary.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(summary)
}

/// CLI: `topten details pending`.
pub async fn run_details_pending(config: &Config, limit: Option<usize>, dry_run: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let limit = limit.unwrap_or(config.enrich.batch_limit);

    if dry_run {
        let missing = store.articles_missing_details().await?;
        println!("details pending (dry-run)");
        println!("  articles without details: {}", missing.len());
        println!("  would fetch: {}", missing.len().min(limit));
        pool.close().await;
        return Ok(());
    }

    let source = WebDetailSource::new(&config.source)?;
    let summary = backfill_details(&store, &source, limit, config.enrich.concurrency).await?;
    summary.print();

    pool.close().await;
    Ok(())
}
