use thiserror::Error;
use prodsearch_core::EmbeddingError;

#[derive(Debug, Error)]
pub enum EmbeddingProviderError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<EmbeddingProviderError> for EmbeddingError {
    fn from(error: EmbeddingProviderError) -> Self {
        match error {
            EmbeddingProviderError::InvalidResponse(message) => {
                EmbeddingError::InvalidResponse(message)
            }
            EmbeddingProviderError::InvalidInput(message) => EmbeddingError::InvalidInput(message),
            EmbeddingProviderError::RateLimited(_) => {
                EmbeddingError::RateLimited { retry_after: None }
            }
            EmbeddingProviderError::Request(message) => EmbeddingError::Provider(message),
            other @ EmbeddingProviderError::Config(_) => EmbeddingError::Other(Box::new(other)),
        }
    }
}
