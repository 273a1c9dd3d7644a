use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use prodsearch_core::{
    Embedding, EmbeddingError, IntentMatch, IntentQuery, IntentSearch, ProductRecord,
    ProductSearch, SearchError, SearchRequest,
};
use prodsearch_server::{app_router, AppState, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

struct UnitEmbedding;

#[async_trait]
impl Embedding for UnitEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }

    fn dimension(&self) -> usize {
        2
    }
}

struct NoProducts;

#[async_trait]
impl ProductSearch for NoProducts {
    async fn search(&self, _request: &SearchRequest) -> Result<Vec<ProductRecord>, SearchError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct RecordingIntents {
    matches: Vec<IntentMatch>,
    fail: bool,
    seen: Mutex<Vec<IntentQuery>>,
}

#[async_trait]
impl IntentSearch for RecordingIntents {
    async fn closest_intents(&self, query: &IntentQuery) -> Result<Vec<IntentMatch>, SearchError> {
        self.seen.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(SearchError::Backend("intent cluster is down".into()));
        }
        Ok(self.matches.iter().take(query.limit).cloned().collect())
    }
}

fn app(intents: Option<Arc<RecordingIntents>>) -> Router {
    let mut state = AppState::new(Arc::new(NoProducts), Arc::new(UnitEmbedding));
    if let Some(intents) = intents {
        state = state.with_intents(intents);
    }
    app_router(state, &ServerConfig::default())
}

async fn classify(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/classify-intent")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn budget_intent() -> IntentMatch {
    IntentMatch {
        intent_id: 12,
        title: "Budget".to_string(),
        prompt: "Suggest cheaper alternatives".to_string(),
        example_queries: vec!["something cheaper".to_string()],
        required_context: vec!["budget".to_string()],
        score: 0.5,
    }
}

#[tokio::test]
async fn best_match_is_returned() {
    let intents = Arc::new(RecordingIntents {
        matches: vec![budget_intent()],
        ..RecordingIntents::default()
    });

    let (status, body) = classify(
        app(Some(intents.clone())),
        json!({"message": "I'm looking for something cheaper", "min_similarity_threshold": 0.4}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "intent_id": 12,
            "title": "Budget",
            "prompt": "Suggest cheaper alternatives",
            "example_queries": ["something cheaper"],
            "required_context": ["budget"],
            "similarity_score": 0.5
        })
    );

    let seen = intents.seen.lock().unwrap();
    assert_eq!(seen[0].limit, 1);
    assert_eq!(seen[0].min_score, Some(0.4));
    assert_eq!(seen[0].vector, vec![1.0, 0.0]);
}

#[tokio::test]
async fn threshold_defaults_when_omitted() {
    let intents = Arc::new(RecordingIntents::default());

    let (status, _) = classify(app(Some(intents.clone())), json!({"message": "hello"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(intents.seen.lock().unwrap()[0].min_score, Some(0.7));
}

#[tokio::test]
async fn no_match_answers_the_generic_intent() {
    let (status, body) = classify(
        app(Some(Arc::new(RecordingIntents::default()))),
        json!({"message": "what's the weather like?"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent_id"], json!(0));
    assert_eq!(body["title"], json!("Generic"));
    assert_eq!(body["prompt"], json!("Generic response"));
    assert_eq!(body["example_queries"], json!([]));
    assert_eq!(body["similarity_score"], json!(0.0));
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let intents = Arc::new(RecordingIntents::default());

    let (status, body) = classify(app(Some(intents.clone())), json!({"message": "  "})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("blank"));
    assert!(intents.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn intent_backend_failure_is_a_bad_gateway() {
    let intents = Arc::new(RecordingIntents {
        fail: true,
        ..RecordingIntents::default()
    });

    let (status, body) = classify(app(Some(intents)), json!({"message": "gift ideas"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], json!("intent search is unavailable"));
}

#[tokio::test]
async fn unconfigured_intents_are_unavailable() {
    let (status, body) = classify(app(None), json!({"message": "gift ideas"})).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], json!("intent classification is not configured"));
}
