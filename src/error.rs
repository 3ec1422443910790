use thiserror::Error;

/// Main error type for RankAssess
#[derive(Error, Debug)]
pub enum AssessError {
    /// Missing credentials or a required service handle
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Judge reply could not be parsed into the expected verdict list
    #[error("Judge failure: {0}")]
    JudgeFailure(String),

    /// Judge API transport or status error
    #[error("Judge API error: {0}")]
    JudgeApi(String),

    /// Reranking service missing or unusable
    #[error("Reranker unavailable: {0}")]
    RerankerUnavailable(String),

    /// Assessment store could not be parsed on read
    #[error("Store corruption: {0}")]
    StoreCorruption(String),

    /// Operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AssessError {
    /// True for failures that abandon a single query but leave the run going.
    pub fn is_query_scoped(&self) -> bool {
        matches!(self, AssessError::JudgeFailure(_) | AssessError::JudgeApi(_))
    }
}

/// Convenient Result type using AssessError
pub type Result<T> = std::result::Result<T, AssessError>;
