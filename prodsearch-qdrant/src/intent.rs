use std::fmt;

use prodsearch_core::{IntentMatch, IntentQuery, IntentSearch, SearchError};
use tracing::Instrument;

use crate::client::CollectionClient;
use crate::config::CollectionEnv;
use crate::mapper::{scored_point_to_intent, ScoredPoint, SearchPointsRequest};
use crate::{QdrantConfig, QdrantSearchError};

/// Similarity search over a collection of intent prompts, usually a separate
/// cluster from the product catalogue.
#[derive(Clone)]
pub struct QdrantIntentSearch {
    inner: CollectionClient,
}

impl fmt::Debug for QdrantIntentSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QdrantIntentSearch")
            .field("base_url", &self.inner.base_url())
            .field("collection", &self.inner.collection())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl QdrantIntentSearch {
    pub fn new(config: QdrantConfig) -> Result<Self, QdrantSearchError> {
        let inner = CollectionClient::new(config)?;

        tracing::info!(
            base_url = %inner.base_url(),
            collection = %inner.collection(),
            "qdrant intent search configured"
        );

        Ok(Self { inner })
    }

    /// Reads `QDRANT_URL_2`, `QDRANT_API_KEY_2` and `QDRANT_COLLECTION_NAME_2`.
    /// Returns `Ok(None)` when none of them is set.
    pub fn from_env() -> Result<Option<Self>, QdrantSearchError> {
        QdrantConfig::from_lookup_if_present(CollectionEnv::INTENTS, |name| {
            std::env::var(name).ok()
        })?
        .map(Self::new)
        .transpose()
    }

    pub fn collection(&self) -> &str {
        self.inner.collection()
    }

    pub async fn verify_collection(&self) -> Result<bool, QdrantSearchError> {
        self.inner.verify_collection().await
    }

    /// Returns the closest intents, best first. Hits below `query.min_score`
    /// are filtered out by the engine.
    pub async fn classify(
        &self,
        query: &IntentQuery,
    ) -> Result<Vec<IntentMatch>, QdrantSearchError> {
        let span = tracing::info_span!(
            "qdrant_intent_search",
            collection = %self.inner.collection(),
            limit = query.limit
        );

        async move {
            let result = self.run_classify(query).await;
            if let Err(err) = &result {
                tracing::error!(error = %err, "intent search failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_classify(
        &self,
        query: &IntentQuery,
    ) -> Result<Vec<IntentMatch>, QdrantSearchError> {
        query.validate().map_err(|err| match err {
            SearchError::InvalidRequest(message) => QdrantSearchError::InvalidRequest(message),
            other => QdrantSearchError::InvalidRequest(other.to_string()),
        })?;

        self.inner.check_dimension(query.vector.len())?;

        let body = SearchPointsRequest {
            vector: query.vector.clone(),
            limit: query.limit,
            with_payload: true,
            filter: None,
            score_threshold: query.min_score,
        };

        let points = self.inner.search_points(&body).await?;
        let intents = collect_intents(points, query.limit);
        tracing::debug!(matched = intents.len(), "qdrant intent search completed");

        Ok(intents)
    }

    pub fn close(self) {
        self.inner.close();
    }
}

/// Maps the top `limit` intent hits, skipping malformed ones.
pub fn collect_intents(points: Vec<ScoredPoint>, limit: usize) -> Vec<IntentMatch> {
    points
        .into_iter()
        .take(limit)
        .filter_map(|point| {
            let point_id = point.id.to_string();
            scored_point_to_intent(point)
                .map_err(|err| {
                    tracing::warn!(
                        point_id = %point_id,
                        error = %err,
                        "skipping malformed intent hit"
                    );
                })
                .ok()
        })
        .collect()
}

#[async_trait::async_trait]
impl IntentSearch for QdrantIntentSearch {
    async fn closest_intents(&self, query: &IntentQuery) -> Result<Vec<IntentMatch>, SearchError> {
        self.classify(query).await.map_err(SearchError::from)
    }
}
