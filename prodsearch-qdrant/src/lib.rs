//! Qdrant search adapters for prodsearch.
//!
//! [`QdrantProductSearch`] runs similarity queries against the product
//! collection over the Qdrant REST API, scoped by tenant and payload filters,
//! and shapes each hit into a [`ProductRecord`]. Hits whose payload cannot be
//! mapped are logged and skipped; they never fail the whole query.
//! [`QdrantIntentSearch`] does the same for a collection of intent prompts.

mod client;
mod config;
mod error;
pub mod filter;
mod intent;
pub mod mapper;

use std::fmt;

use client::CollectionClient;
pub use config::{
    normalize_base_url, CollectionEnv, QdrantConfig, QdrantSearchBuilder, DEFAULT_TIMEOUT,
    ENV_COLLECTION_NAME, ENV_INTENT_COLLECTION_NAME, ENV_QDRANT_API_KEY,
    ENV_QDRANT_INTENT_API_KEY, ENV_QDRANT_INTENT_URL, ENV_QDRANT_TIMEOUT_SECS, ENV_QDRANT_URL,
    ENV_QDRANT_VECTOR_SIZE,
};
pub use error::QdrantSearchError;
use filter::{qdrant_filter_to_payload, request_filter};
pub use intent::{collect_intents, QdrantIntentSearch};
use mapper::{scored_point_to_product, ScoredPoint, SearchPointsRequest};
use prodsearch_core::{ProductRecord, ProductSearch, SearchError, SearchRequest};
use tracing::Instrument;

#[derive(Clone)]
pub struct QdrantProductSearch {
    inner: CollectionClient,
}

impl fmt::Debug for QdrantProductSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QdrantProductSearch")
            .field("base_url", &self.inner.base_url())
            .field("collection", &self.inner.collection())
            .field("api_key", &"<redacted>")
            .field("vector_size", &self.inner.vector_size())
            .finish()
    }
}

impl QdrantProductSearch {
    pub fn builder() -> QdrantSearchBuilder {
        QdrantSearchBuilder::new()
    }

    /// Builds the HTTP client for `config`. No request is made here; call
    /// [`QdrantProductSearch::verify_collection`] to check reachability.
    pub fn new(config: QdrantConfig) -> Result<Self, QdrantSearchError> {
        let inner = CollectionClient::new(config)?;

        tracing::info!(
            base_url = %inner.base_url(),
            collection = %inner.collection(),
            "qdrant product search configured"
        );

        Ok(Self { inner })
    }

    /// Shorthand for [`QdrantConfig::from_env`] followed by [`QdrantProductSearch::new`].
    pub fn from_env() -> Result<Self, QdrantSearchError> {
        Self::new(QdrantConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    pub fn collection(&self) -> &str {
        self.inner.collection()
    }

    pub fn vector_size(&self) -> Option<usize> {
        self.inner.vector_size()
    }

    /// Lists the collections on the server and reports whether ours is among
    /// them. A missing collection is logged, not returned as an error; only a
    /// failure to talk to the server is.
    pub async fn verify_collection(&self) -> Result<bool, QdrantSearchError> {
        self.inner.verify_collection().await
    }

    /// Runs a similarity query and returns at most `request.limit` products,
    /// in the order the engine ranked them.
    pub async fn query(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<ProductRecord>, QdrantSearchError> {
        let span = tracing::info_span!(
            "qdrant_product_search",
            collection = %self.inner.collection(),
            limit = request.limit,
            filtered = request.is_filtered()
        );

        async move {
            let result = self.run_query(request).await;
            if let Err(err) = &result {
                tracing::error!(error = %err, "product search failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_query(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<ProductRecord>, QdrantSearchError> {
        request.validate().map_err(|err| match err {
            SearchError::InvalidRequest(message) => QdrantSearchError::InvalidRequest(message),
            other => QdrantSearchError::InvalidRequest(other.to_string()),
        })?;

        self.inner.check_dimension(request.vector.len())?;

        let filter = request_filter(request)?
            .map(|filter| qdrant_filter_to_payload(&filter))
            .transpose()?;
        tracing::debug!(filter = ?filter, "sending qdrant search");

        let body = SearchPointsRequest {
            vector: request.vector.clone(),
            limit: request.limit,
            with_payload: true,
            filter,
            score_threshold: None,
        };

        let points = self.inner.search_points(&body).await?;

        let hits = points.len();
        let products = collect_products(points, request.limit);
        tracing::debug!(hits, returned = products.len(), "qdrant search completed");

        Ok(products)
    }

    /// Releases the connection pool. Queries cannot outlive this call since
    /// it takes the adapter by value.
    pub fn close(self) {
        self.inner.close();
    }
}

/// Maps the top `limit` hits, skipping any whose payload does not fit the
/// product schema.
pub fn collect_products(points: Vec<ScoredPoint>, limit: usize) -> Vec<ProductRecord> {
    points
        .into_iter()
        .take(limit)
        .filter_map(|point| {
            let point_id = point.id.to_string();
            match scored_point_to_product(point) {
                Ok(product) => Some(product),
                Err(err) => {
                    tracing::warn!(
                        point_id = %point_id,
                        error = %err,
                        "skipping malformed search hit"
                    );
                    None
                }
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl ProductSearch for QdrantProductSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ProductRecord>, SearchError> {
        self.query(request).await.map_err(SearchError::from)
    }
}
