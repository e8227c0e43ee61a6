//! # Top 10 Archive
//!
//! Records the news site's daily "Top 10" most-read ranking and answers
//! "which articles mattered most between these dates?".
//!
//! Each capture stores one position per article. A position `p` is worth
//! `1 / 2^(p-1)`; per day only an article's best position counts, and an
//! article's rating over a range is the sum of its daily best values.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Ranking page │──▶│  Pipeline   │──▶│  SQLite  │
//! │ (scraper)    │   │ validate+rec│   │ (sqlx)   │
//! └──────────────┘   └─────────────┘   └────┬─────┘
//!        ┌──────────────────────────────────┤
//!        ▼                                  ▼
//! ┌──────────────┐                    ┌──────────┐
//! │ Detail fetch │                    │ CLI/HTTP │
//! │ (og: tags)   │                    │ ratings  │
//! └──────────────┘                    └──────────┘
//! ```
//!
//! The storage-agnostic pieces (models, rating arithmetic, the ingestion
//! pipeline, the store trait) live in `topten-core` and are re-exported here.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite implementation of the archive store |
//! | [`scrape`] | Ranking and detail extraction from HTML |
//! | [`ingest`] | Ingestion command and capture timestamps |
//! | [`enrich`] | Detail backfill |
//! | [`ratings`] | Rating pages for the CLI and server |
//! | [`stats`] | Archive statistics |
//! | [`server`] | HTTP server |

pub mod config;
pub mod db;
pub mod enrich;
pub mod ingest;
pub mod migrate;
pub mod ratings;
pub mod scrape;
pub mod server;
pub mod sqlite_store;
pub mod stats;

pub use topten_core::{models, pipeline, rating, source, store, ArchiveError};
