use prodsearch_core::SearchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QdrantSearchError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),
    #[error("invalid environment variable {name}: {reason}")]
    InvalidEnvVar { name: String, reason: String },
    #[error("invalid configuration: base_url is required")]
    MissingBaseUrl,
    #[error("invalid configuration: base_url cannot be empty")]
    EmptyBaseUrl,
    #[error("invalid configuration: base_url '{url}' is not usable: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("invalid configuration: api_key is required")]
    MissingApiKey,
    #[error("invalid configuration: api_key cannot be empty")]
    EmptyApiKey,
    #[error("invalid configuration: collection is required")]
    MissingCollection,
    #[error("invalid configuration: collection cannot be empty")]
    EmptyCollection,
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
    #[error("query vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("unsupported filter value for key '{key}': {reason}")]
    UnsupportedFilterValue { key: String, reason: String },
    #[error("qdrant point '{point_id}' has an invalid product payload: {reason}")]
    InvalidPayload { point_id: String, reason: String },
    #[error("qdrant request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("collection '{collection}' not found: {message}")]
    CollectionNotFound { collection: String, message: String },
    #[error("qdrant returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("invalid qdrant response: {message}")]
    InvalidResponse { message: String },
}

impl From<QdrantSearchError> for SearchError {
    fn from(value: QdrantSearchError) -> Self {
        match value {
            QdrantSearchError::InvalidRequest(message) => SearchError::InvalidRequest(message),
            QdrantSearchError::DimensionMismatch { expected, got } => {
                SearchError::DimensionMismatch { expected, got }
            }
            QdrantSearchError::UnsupportedFilterValue { key, reason } => {
                SearchError::InvalidFilter { key, reason }
            }
            other => SearchError::Backend(Box::new(other)),
        }
    }
}
