use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_openai::Client;
use async_trait::async_trait;
use prodsearch_core::{Embedding, EmbeddingError};

use crate::{EmbeddingProviderError, OpenAiEmbeddingConfig};

#[derive(Clone)]
pub struct OpenAiEmbedding {
    client: Client<OpenAIConfig>,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedding {
    pub fn new(config: OpenAiEmbeddingConfig) -> Self {
        let mut openai = OpenAIConfig::new().with_api_key(config.api_key);
        if let Some(api_base) = config.api_base {
            openai = openai.with_api_base(api_base);
        }

        Self::with_client(Client::with_config(openai), config.model, config.dimension)
    }

    pub fn with_client(
        client: Client<OpenAIConfig>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), EmbeddingProviderError> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingProviderError::InvalidResponse(format!(
                "expected embedding dimension {}, got {}",
                self.dimension,
                embedding.len()
            )));
        }
        Ok(())
    }
}

fn provider_error(error: OpenAIError) -> EmbeddingProviderError {
    match error {
        OpenAIError::ApiError(api) => {
            let rate_limited = api
                .r#type
                .as_deref()
                .is_some_and(|kind| kind.contains("rate_limit"))
                || api.message.to_lowercase().contains("rate limit");
            if rate_limited {
                EmbeddingProviderError::RateLimited(api.message)
            } else {
                EmbeddingProviderError::Request(api.message)
            }
        }
        OpenAIError::JSONDeserialize(err) => {
            EmbeddingProviderError::InvalidResponse(err.to_string())
        }
        OpenAIError::InvalidArgument(message) => EmbeddingProviderError::InvalidInput(message),
        other => EmbeddingProviderError::Request(other.to_string()),
    }
}

fn require_text(text: &str) -> Result<(), EmbeddingProviderError> {
    if text.trim().is_empty() {
        return Err(EmbeddingProviderError::InvalidInput(
            "text to embed must not be blank".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl Embedding for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        require_text(text)?;

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(text)
            .build()
            .map_err(|err| EmbeddingError::Other(Box::new(err)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(provider_error)?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| {
                EmbeddingProviderError::InvalidResponse("missing embedding".to_string())
            })?;

        self.check_dimension(&embedding)?;
        tracing::debug!(model = %self.model, dimension = embedding.len(), "embedded query text");

        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            require_text(text)?;
        }

        let inputs = texts.to_vec();
        let inputs_len = inputs.len();
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(inputs)
            .build()
            .map_err(|err| EmbeddingError::Other(Box::new(err)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(provider_error)?;

        if response.data.len() != inputs_len {
            return Err(EmbeddingProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                inputs_len,
                response.data.len()
            ))
            .into());
        }

        let mut data = response.data;
        data.sort_by_key(|item| item.index);

        let mut out = Vec::with_capacity(data.len());
        for item in data {
            self.check_dimension(&item.embedding)?;
            out.push(item.embedding);
        }

        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
