//! Ingestion entry points for the CLI and the scheduler trigger.
//!
//! Resolves the capture timestamp, runs the core pipeline against SQLite and
//! optionally backfills details for articles that still lack them.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, NaiveTime, Utc};
use tracing::{info, warn};

use topten_core::error::ArchiveError;
use topten_core::models::IngestReport;
use topten_core::pipeline;
use topten_core::source::RankingSource;
use topten_core::store::ArchiveStore;

use crate::config::{Config, IngestConfig};
use crate::db;
use crate::enrich;
use crate::scrape::{HtmlFileSource, WebDetailSource, WebRankingSource};
use crate::sqlite_store::SqliteStore;

/// The timestamp a capture is stored under. Always UTC.
pub fn capture_time(config: &IngestConfig, at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let at = at.unwrap_or_else(Utc::now);
    if config.truncate_to_day {
        at.date_naive().and_time(NaiveTime::MIN).and_utc()
    } else {
        at
    }
}

/// Run one ingestion from `source` into `store`.
pub async fn ingest_once(
    config: &Config,
    source: &dyn RankingSource,
    store: &dyn ArchiveStore,
    at: Option<DateTime<Utc>>,
) -> Result<IngestReport, ArchiveError> {
    let captured_at = capture_time(&config.ingest, at);
    pipeline::fetch_and_ingest(source, store, captured_at, config.ingest.expected_len()).await
}

/// CLI: `topten ingest`.
pub async fn run_ingest(
    config: &Config,
    html: Option<PathBuf>,
    at: Option<DateTime<Utc>>,
    skip_details: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let source: Box<dyn RankingSource> = match html {
        Some(path) => Box::new(HtmlFileSource::new(path, &config.source)),
        None => Box::new(WebRankingSource::new(&config.source)?),
    };

    match ingest_once(config, source.as_ref(), &store, at).await {
        Ok(report) => {
            println!("ingest {}", report.captured_at.to_rfc3339());
            println!(
                "  recorded {} positions ({} new articles)",
                report.articles.len(),
                report.new_articles
            );
        }
        Err(ArchiveError::AlreadyRecorded { captured_at }) => {
            warn!(%captured_at, "ranking already recorded");
            println!("already recorded for {}", captured_at.to_rfc3339());
        }
        Err(e) => {
            pool.close().await;
            return Err(e.into());
        }
    }

    let result = if skip_details {
        Ok(())
    } else {
        backfill_after_ingest(config, &store).await
    };

    pool.close().await;
    result
}

async fn backfill_after_ingest(config: &Config, store: &SqliteStore) -> Result<()> {
    let details = WebDetailSource::new(&config.source)?;
    let summary = enrich::backfill_details(
        store,
        &details,
        config.enrich.batch_limit,
        config.enrich.concurrency,
    )
    .await?;
    info!(
        attached = summary.attached,
        failed = summary.failed,
        "detail backfill finished"
    );
    summary.print();
    Ok(())
}
