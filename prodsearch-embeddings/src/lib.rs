mod config;
mod error;

#[cfg(feature = "openai")]
mod openai;

pub use config::{OpenAiEmbeddingConfig, DEFAULT_DIMENSION, DEFAULT_MODEL};
pub use error::EmbeddingProviderError;

#[cfg(feature = "openai")]
pub use openai::OpenAiEmbedding;
