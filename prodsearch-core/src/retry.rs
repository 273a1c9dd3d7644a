use std::time::Duration;

use async_trait::async_trait;

use crate::{Embedding, EmbeddingError};

/// Exponential backoff between embedding attempts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff: Duration::from_secs(4),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `failed_attempt + 1`; `failed_attempt` starts at 1.
    pub fn backoff_after(&self, failed_attempt: usize) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16) as u32;
        self.initial_backoff
            .saturating_mul(2_u32.saturating_pow(exponent))
            .min(self.max_backoff)
    }
}

pub fn is_retryable(error: &EmbeddingError) -> bool {
    matches!(
        error,
        EmbeddingError::Provider(_)
            | EmbeddingError::RateLimited { .. }
            | EmbeddingError::Timeout(_)
    )
}

pub struct Retrying<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E> Retrying<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Embedding> Retrying<E> {
    async fn attempt(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let max_attempts = self.policy.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.inner.embed(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(error) => {
                    if !is_retryable(&error) || attempt >= max_attempts {
                        return Err(error);
                    }

                    let delay = match &error {
                        EmbeddingError::RateLimited {
                            retry_after: Some(retry_after),
                        } => (*retry_after).min(self.policy.max_backoff),
                        _ => self.policy.backoff_after(attempt),
                    };
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "embedding attempt failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl<E: Embedding> Embedding for Retrying<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.attempt(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.attempt(text).await?);
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}
