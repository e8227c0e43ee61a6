//! Archive statistics.
//!
//! A quick summary of what has been captured: article and position counts,
//! details coverage, and the first/last capture. Used by `topten stats` to
//! confirm that scheduled ingestion is actually landing.

use anyhow::Result;

use crate::config::Config;
use crate::db;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_articles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(&pool)
        .await?;

    let total_positions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM positions")
        .fetch_one(&pool)
        .await?;

    let total_captures: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT captured_at) FROM positions")
            .fetch_one(&pool)
            .await?;

    let total_details: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM article_details")
        .fetch_one(&pool)
        .await?;

    let (first_capture, last_capture): (Option<i64>, Option<i64>) =
        sqlx::query_as("SELECT MIN(captured_at), MAX(captured_at) FROM positions")
            .fetch_one(&pool)
            .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Top 10 Archive: Database Stats");
    println!("==============================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Articles:    {}", total_articles);
    println!("  Captures:    {}", total_captures);
    println!("  Positions:   {}", total_positions);
    println!(
        "  Details:     {} / {} ({}%)",
        total_details,
        total_articles,
        if total_articles > 0 {
            (total_details * 100) / total_articles
        } else {
            0
        }
    );
    println!(
        "  First:       {}",
        first_capture.map(format_capture).unwrap_or_else(|| "never".to_string())
    );
    println!(
        "  Last:        {}",
        last_capture.map(format_capture).unwrap_or_else(|| "never".to_string())
    );
    println!();

    pool.close().await;
    Ok(())
}

fn format_capture(ms: i64) -> String {
    format!("{} ({})", format_ts_iso(ms), format_ts_relative(ms))
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a millisecond timestamp relative to now (e.g. "3 days ago").
fn format_ts_relative(ms: i64) -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let delta = (now - ms) / 1000;

    if delta < 0 {
        "in the future".to_string()
    } else if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    }
}

fn format_ts_iso(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}
