use std::fmt;

use crate::EmbeddingProviderError;

pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_DIMENSION: usize = 1536;

/// Settings for the OpenAI embeddings endpoint.
#[derive(Clone)]
pub struct OpenAiEmbeddingConfig {
    pub api_key: String,
    pub model: String,
    pub dimension: usize,
    /// Overrides the API base URL, e.g. for a proxy.
    pub api_base: Option<String>,
}

impl fmt::Debug for OpenAiEmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbeddingConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl OpenAiEmbeddingConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
            api_base: None,
        }
    }

    /// Reads `OPENAI_API_KEY`, `OPENAI_EMBEDDING_MODEL`,
    /// `OPENAI_EMBEDDING_DIMENSION` and `OPENAI_API_BASE`.
    pub fn from_env() -> Result<Self, EmbeddingProviderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, EmbeddingProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = non_blank("OPENAI_API_KEY").ok_or_else(|| {
            EmbeddingProviderError::Config("OPENAI_API_KEY must be set".to_string())
        })?;

        let mut config = Self::new(api_key);
        if let Some(model) = non_blank("OPENAI_EMBEDDING_MODEL") {
            config.model = model;
        }
        if let Some(dimension) = non_blank("OPENAI_EMBEDDING_DIMENSION") {
            config.dimension = dimension
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|dimension| *dimension > 0)
                .ok_or_else(|| {
                    EmbeddingProviderError::Config(format!(
                        "OPENAI_EMBEDDING_DIMENSION must be a positive integer, got '{dimension}'"
                    ))
                })?;
        }
        config.api_base = non_blank("OPENAI_API_BASE");

        Ok(config)
    }
}
