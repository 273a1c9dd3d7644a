//! `POST /recommend`: embed the shopper's query and return matching products
//! as a bare JSON array of storefront products.
//!
//! ```json
//! {"query": "crunchy vegan snacks", "limit": 3, "client_id": "acme",
//!  "filters": {"category": "snacks", "price": {"range": {"lte": 10}}}}
//! ```

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use prodsearch_core::{JsonMap, SearchRequest};
use serde::Deserialize;
use tracing::Instrument;

use crate::error::{ApiError, ApiResult};
use crate::storefront::StorefrontProduct;
use crate::AppState;

pub const DEFAULT_RECOMMEND_LIMIT: usize = 3;

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub filters: Option<JsonMap>,
}

fn default_limit() -> usize {
    DEFAULT_RECOMMEND_LIMIT
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/recommend", post(recommend))
}

async fn recommend(
    State(state): State<AppState>,
    Json(body): Json<RecommendRequest>,
) -> ApiResult<Json<Vec<StorefrontProduct>>> {
    let query = body.query.trim().to_string();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be blank".to_string()));
    }
    if body.limit == 0 {
        return Err(ApiError::BadRequest(
            "limit must be greater than 0".to_string(),
        ));
    }

    // Filters are checked before paying for an embedding call.
    let mut request = SearchRequest::new(Vec::new()).with_limit(body.limit);
    if let Some(client_id) = body.client_id.filter(|id| !id.trim().is_empty()) {
        request = request.with_client_id(client_id);
    }
    if let Some(filters) = body.filters {
        request = request.with_json_filters(filters)?;
    }

    let span = tracing::info_span!(
        "recommend",
        limit = request.limit,
        client_id = request.client_id.as_deref().unwrap_or("")
    );

    async move {
        request.vector = state.embedder.embed(&query).await?;
        let products = state.search.search(&request).await?;
        tracing::debug!(hits = products.len(), "search returned");

        let products = if products.is_empty() && !state.fallback.is_empty() {
            tracing::info!("no products matched, serving fallback catalogue");
            state.fallback.to_vec()
        } else {
            products.into_iter().map(StorefrontProduct::from).collect()
        };

        Ok::<_, ApiError>(Json(products))
    }
    .instrument(span)
    .await
}
