use std::fmt;

use serde::Deserialize;

use crate::mapper::{ApiResponse, CollectionsList, ScoredPoint, SearchPointsRequest};
use crate::{config, QdrantConfig, QdrantSearchError};

/// REST access to a single Qdrant collection.
#[derive(Clone)]
pub(crate) struct CollectionClient {
    client: reqwest::Client,
    base: reqwest::Url,
    base_url: String,
    collection: String,
    api_key: String,
    vector_size: Option<usize>,
}

impl fmt::Debug for CollectionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionClient")
            .field("base_url", &self.base_url)
            .field("collection", &self.collection)
            .field("api_key", &"<redacted>")
            .field("vector_size", &self.vector_size)
            .finish()
    }
}

impl CollectionClient {
    pub(crate) fn new(config: QdrantConfig) -> Result<Self, QdrantSearchError> {
        let base = reqwest::Url::parse(&config.base_url)
            .map_err(|err| err.to_string())
            .and_then(|url| {
                if url.cannot_be_a_base() {
                    Err("url cannot carry a path".to_string())
                } else {
                    Ok(url)
                }
            })
            .map_err(|reason| QdrantSearchError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason,
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        if config::looks_like_qdrant_cloud(&config.base_url)
            && config.base_url.starts_with("http://")
        {
            tracing::warn!(
                base_url = %config.base_url,
                "Qdrant Cloud requires https; plain http requests are likely to be rejected"
            );
        }

        Ok(Self {
            client,
            base,
            base_url: config.base_url,
            collection: config.collection,
            api_key: config.api_key,
            vector_size: config.vector_size,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn collection(&self) -> &str {
        &self.collection
    }

    pub(crate) fn vector_size(&self) -> Option<usize> {
        self.vector_size
    }

    pub(crate) fn check_dimension(&self, got: usize) -> Result<(), QdrantSearchError> {
        match self.vector_size {
            Some(expected) if expected != got => {
                Err(QdrantSearchError::DimensionMismatch { expected, got })
            }
            _ => Ok(()),
        }
    }

    pub(crate) async fn verify_collection(&self) -> Result<bool, QdrantSearchError> {
        let response: ApiResponse<CollectionsList> = self
            .send_and_decode(self.request_builder(reqwest::Method::GET, &["collections"]))
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "failed to list qdrant collections");
                err
            })?;

        let exists = response
            .result
            .collections
            .iter()
            .any(|collection| collection.name == self.collection);

        if exists {
            tracing::info!(collection = %self.collection, "qdrant collection is available");
        } else {
            tracing::error!(
                collection = %self.collection,
                available = response.result.collections.len(),
                "qdrant collection does not exist"
            );
        }

        Ok(exists)
    }

    pub(crate) async fn search_points(
        &self,
        body: &SearchPointsRequest,
    ) -> Result<Vec<ScoredPoint>, QdrantSearchError> {
        let request = self
            .request_builder(
                reqwest::Method::POST,
                &["collections", self.collection.as_str(), "points", "search"],
            )
            .json(body);
        let response: ApiResponse<Vec<ScoredPoint>> = self.send_and_decode(request).await?;
        Ok(response.result)
    }

    pub(crate) fn close(self) {
        tracing::debug!(collection = %self.collection, "closing qdrant collection client");
        drop(self.client);
    }

    /// Each segment is percent-encoded, so a collection name cannot alter
    /// the rest of the URL.
    fn endpoint(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request_builder(
        &self,
        method: reqwest::Method,
        segments: &[&str],
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.endpoint(segments))
            .header("api-key", &self.api_key)
    }

    async fn send_and_decode<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, QdrantSearchError> {
        let response = request.send().await.map_err(QdrantSearchError::from)?;
        let status = response.status();
        let body = response.text().await.map_err(QdrantSearchError::from)?;

        if !status.is_success() {
            return Err(self.http_error_from_response(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|err| QdrantSearchError::InvalidResponse {
            message: format!("failed to decode qdrant response body: {err}"),
        })
    }

    fn http_error_from_response(&self, status: u16, body: &str) -> QdrantSearchError {
        let message = qdrant_error_message(body);
        if status == 404 && message.to_lowercase().contains("collection") {
            return QdrantSearchError::CollectionNotFound {
                collection: self.collection.clone(),
                message,
            };
        }

        QdrantSearchError::HttpStatus { status, message }
    }
}

#[derive(Debug, Deserialize)]
struct QdrantErrorEnvelope {
    status: QdrantErrorStatus,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QdrantErrorStatus {
    Message(String),
    Structured { error: String },
}

fn qdrant_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "unknown qdrant error".to_string();
    }

    serde_json::from_str::<QdrantErrorEnvelope>(trimmed)
        .map(|envelope| match envelope.status {
            QdrantErrorStatus::Message(message) => message,
            QdrantErrorStatus::Structured { error } => error,
        })
        .unwrap_or_else(|_| trimmed.to_string())
}
