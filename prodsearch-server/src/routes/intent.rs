//! `POST /api/classify-intent`: match a shopper's message to the closest
//! stored intent prompt, or to the generic intent when nothing is close
//! enough.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use prodsearch_core::{IntentMatch, IntentQuery};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const DEFAULT_INTENT_LIMIT: usize = 1;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

#[derive(Debug, Deserialize)]
pub struct IntentClassificationRequest {
    pub message: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_threshold")]
    pub min_similarity_threshold: f32,
}

fn default_limit() -> usize {
    DEFAULT_INTENT_LIMIT
}

fn default_threshold() -> f32 {
    DEFAULT_SIMILARITY_THRESHOLD
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct IntentClassificationResponse {
    pub intent_id: i64,
    pub title: String,
    pub prompt: String,
    pub example_queries: Vec<String>,
    pub required_context: Vec<String>,
    pub similarity_score: f32,
}

impl From<IntentMatch> for IntentClassificationResponse {
    fn from(intent: IntentMatch) -> Self {
        Self {
            intent_id: intent.intent_id,
            title: intent.title,
            prompt: intent.prompt,
            example_queries: intent.example_queries,
            required_context: intent.required_context,
            similarity_score: intent.score,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/classify-intent", post(classify_intent))
}

async fn classify_intent(
    State(state): State<AppState>,
    Json(body): Json<IntentClassificationRequest>,
) -> ApiResult<Json<IntentClassificationResponse>> {
    let message = body.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message must not be blank".to_string()));
    }
    if body.limit == 0 {
        return Err(ApiError::BadRequest(
            "limit must be greater than 0".to_string(),
        ));
    }
    let Some(intents) = state.intents.clone() else {
        return Err(ApiError::Unavailable(
            "intent classification is not configured",
        ));
    };

    let limit = body.limit;
    let threshold = body.min_similarity_threshold;
    let span = tracing::info_span!("classify_intent", limit, threshold);

    async move {
        let vector = state.embedder.embed(&message).await?;
        let query = IntentQuery::new(vector)
            .with_limit(limit)
            .with_min_score(threshold);

        let best = intents
            .closest_intents(&query)
            .await
            .map_err(ApiError::intent_search)?
            .into_iter()
            .next();

        let intent = match best {
            Some(intent) => {
                tracing::debug!(
                    intent_id = intent.intent_id,
                    score = intent.score,
                    "intent matched"
                );
                intent
            }
            None => {
                tracing::info!("no intent cleared the similarity threshold, answering generic");
                IntentMatch::generic()
            }
        };

        Ok::<_, ApiError>(Json(intent.into()))
    }
    .instrument(span)
    .await
}
