//! # Top 10 Archive CLI (`topten`)
//!
//! Records the news site's daily "Top 10" ranking and ranks articles over a
//! date range by how prominently and how often they appeared.
//!
//! ## Usage
//!
//! ```bash
//! topten --config ./config/topten.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `topten init` | Create the SQLite database and run schema migrations |
//! | `topten ingest` | Fetch today's ranking and record it |
//! | `topten details pending` | Backfill description/image for articles lacking them |
//! | `topten ratings` | Print aggregated ratings for a day or a range |
//! | `topten stats` | Summarize what the archive holds |
//! | `topten serve` | Start the HTTP server (ratings JSON + scheduler trigger) |
//!
//! ## Examples
//!
//! ```bash
//! topten init
//! topten ingest
//! topten ingest --html ./saved/front.html --at 2024-05-17 --skip-details
//! topten ratings --from 2024-05-01 --to 2024-05-31 --limit 20
//! topten serve
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt::time::UtcTime, EnvFilter};

use topten_archive::{config, enrich, ingest, migrate, ratings, server, stats};

/// Top 10 Archive: a daily archive of the news site's most-read ranking.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/topten.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "topten",
    about = "Top 10 Archive: records the daily most-read ranking and rates articles over time",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/topten.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Fetch the current ranking and record it.
    ///
    /// Re-running for a capture that already exists reports it and exits
    /// successfully without writing anything.
    Ingest {
        /// Read the ranking from a saved HTML page instead of the site.
        #[arg(long)]
        html: Option<PathBuf>,

        /// Capture time (RFC 3339 or YYYY-MM-DD). Defaults to now.
        #[arg(long, value_parser = parse_capture_time)]
        at: Option<DateTime<Utc>>,

        /// Do not fetch details for new articles afterwards.
        #[arg(long)]
        skip_details: bool,
    },

    /// Manage article details.
    Details {
        #[command(subcommand)]
        action: DetailsAction,
    },

    /// Print aggregated ratings.
    ///
    /// Without arguments, shows today (UTC).
    Ratings {
        /// A single day (YYYY-MM-DD). Takes precedence over --from/--to.
        #[arg(long)]
        date: Option<String>,

        /// First day of the range (inclusive).
        #[arg(long)]
        from: Option<String>,

        /// Last day of the range (inclusive).
        #[arg(long)]
        to: Option<String>,

        /// Show at most this many articles.
        #[arg(long)]
        limit: Option<usize>,

        /// Emit the page as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show archive statistics.
    Stats,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum DetailsAction {
    /// Fetch details for articles that do not have them yet.
    Pending {
        /// Maximum number of articles to process.
        #[arg(long)]
        limit: Option<usize>,

        /// Only report how many articles are missing details.
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_capture_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| format!("invalid capture time '{}', expected RFC 3339 or YYYY-MM-DD", s))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            html,
            at,
            skip_details,
        } => {
            ingest::run_ingest(&cfg, html, at, skip_details).await?;
        }
        Commands::Details { action } => match action {
            DetailsAction::Pending { limit, dry_run } => {
                enrich::run_details_pending(&cfg, limit, dry_run).await?;
            }
        },
        Commands::Ratings {
            date,
            from,
            to,
            limit,
            json,
        } => {
            ratings::run_ratings(&cfg, date, from, to, limit, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
