//! # Top 10 Archive Core
//!
//! Storage-agnostic logic for the Top 10 archive: data models, the error
//! taxonomy, the [`store::ArchiveStore`] abstraction, the daily ingestion
//! pipeline and the decayed rating aggregation.
//!
//! This crate contains no sqlx, HTTP or filesystem I/O. The SQLite backend,
//! the HTML collaborators and the CLI/server live in `topten-archive`.
//!
//! ## Data Flow
//!
//! ```text
//! RankingSource ──▶ pipeline::ingest_day ──▶ ArchiveStore
//!   (link,title)      resolve + record           │
//!                                                ▼
//!                     pipeline::query_ratings ◀── positions_between
//!                        rating::aggregate
//! ```

pub mod error;
pub mod models;
pub mod pipeline;
pub mod rating;
pub mod source;
pub mod store;

pub use error::{ArchiveError, Result};
