use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prodsearch_core::{EmbeddingError, SearchError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("product search failed: {0}")]
    Search(SearchError),
    #[error("intent search failed: {0}")]
    IntentSearch(SearchError),
    #[error("{0}")]
    Unavailable(&'static str),
}

impl ApiError {
    pub fn intent_search(err: SearchError) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::IntentSearch(err)
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Search(err)
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Upstream details stay in the logs.
        let (status, message) = match &self {
            ApiError::BadRequest(message) => {
                tracing::warn!(error = %message, "rejected request");
                (StatusCode::BAD_REQUEST, message.clone())
            }
            ApiError::Embedding(err) => {
                tracing::error!(error = %err, "query embedding failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "query embedding is unavailable".to_string(),
                )
            }
            ApiError::Search(err) => {
                tracing::error!(error = %err, "product search failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "product search is unavailable".to_string(),
                )
            }
            ApiError::IntentSearch(err) => {
                tracing::error!(error = %err, "intent search failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "intent search is unavailable".to_string(),
                )
            }
            ApiError::Unavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, message.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
