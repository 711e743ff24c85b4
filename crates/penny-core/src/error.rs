//! Error types for Penny

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Month token that is not `YYYY-M` / `YYYY-MM`
    #[error("Invalid period: {0:?} (expected YYYY-MM)")]
    InvalidPeriod(String),

    /// Transient data-layer failure; callers may retry
    #[error("Transaction store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Description cannot be empty")]
    EmptyDescription,

    // Text-generation failures. These never leave the report/suggestion
    // pipelines; they select the fallback or default result instead.
    #[error("Text generation timed out")]
    GenerationTimeout,

    #[error("Text generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Malformed model output: {0}")]
    GenerationMalformed(String),
}

impl Error {
    /// Whether this is one of the internal text-generation failures
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            Self::GenerationTimeout | Self::GenerationUnavailable(_) | Self::GenerationMalformed(_)
        )
    }

    /// Classify a reqwest error from a text-generation call
    pub(crate) fn from_generation(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::GenerationTimeout
        } else {
            Self::GenerationUnavailable(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
