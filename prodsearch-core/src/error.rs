use std::{error::Error as StdError, fmt, time::Duration};

use thiserror::Error;

#[derive(Debug)]
pub enum EmbeddingError {
    InvalidInput(String),
    InvalidResponse(String),
    RateLimited { retry_after: Option<Duration> },
    Timeout(Duration),
    Provider(String),
    Other(Box<dyn StdError + Send + Sync>),
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingError::InvalidInput(message) => {
                write!(f, "Embedding invalid input: {message}")
            }
            EmbeddingError::InvalidResponse(message) => {
                write!(f, "Embedding invalid response: {message}")
            }
            EmbeddingError::RateLimited { retry_after } => match retry_after {
                Some(duration) => write!(f, "Embedding rate limited (retry_after={duration:?})"),
                None => write!(f, "Embedding rate limited (retry_after=unknown)"),
            },
            EmbeddingError::Timeout(duration) => write!(f, "Embedding timeout after {duration:?}"),
            EmbeddingError::Provider(message) => write!(f, "Embedding provider error: {message}"),
            EmbeddingError::Other(error) => write!(f, "Embedding error: {error}"),
        }
    }
}

impl StdError for EmbeddingError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            EmbeddingError::Other(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

/// Failure of a product search, as seen by callers of [`crate::ProductSearch`].
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("invalid filter for field '{key}': {reason}")]
    InvalidFilter { key: String, reason: String },
    #[error("Search backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl SearchError {
    /// True when the caller sent something the backend was never asked about.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidRequest(_)
                | SearchError::DimensionMismatch { .. }
                | SearchError::InvalidFilter { .. }
        )
    }
}
