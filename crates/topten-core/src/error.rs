//! Error taxonomy shared by every archive operation.
//!
//! Three families matter to callers:
//!
//! - **validation**: malformed input, rejected before any store mutation;
//! - **conflict**: a uniqueness invariant already holds for the record
//!   (a re-run of the same capture, or an article already enriched);
//! - **storage** / **source**: backend or collaborator failures, propagated
//!   unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::models::ArticleId;

pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("expected {expected} ranking entries, got {actual}")]
    UnexpectedListLength { expected: usize, actual: usize },

    #[error("ranking list is empty")]
    EmptyList,

    #[error("ranking entry at position {position} has an empty link")]
    EmptyIdentityKey { position: usize },

    #[error("ranking entry at position {position} repeats the link of position {first}")]
    DuplicateIdentityKey { position: usize, first: usize },

    #[error("invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("unknown article {0}")]
    UnknownArticle(ArticleId),

    #[error("ranking already recorded for {captured_at}")]
    AlreadyRecorded { captured_at: DateTime<Utc> },

    #[error("details already attached to article {0}")]
    DetailsExist(ArticleId),

    #[error("ranking source failed: {0:#}")]
    Source(anyhow::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ArchiveError {
    /// True for uniqueness violations a caller may treat as a benign re-run.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ArchiveError::AlreadyRecorded { .. } | ArchiveError::DetailsExist(_)
        )
    }

    /// True for input rejected before touching the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ArchiveError::UnexpectedListLength { .. }
                | ArchiveError::EmptyList
                | ArchiveError::EmptyIdentityKey { .. }
                | ArchiveError::DuplicateIdentityKey { .. }
                | ArchiveError::InvalidRange { .. }
                | ArchiveError::UnknownArticle(_)
        )
    }
}
