use std::collections::HashMap;

use prodsearch_core::{IntentQuery, IntentSearch, SearchError};
use prodsearch_qdrant::mapper::{scored_point_to_intent, PointId, ScoredPoint};
use prodsearch_qdrant::{
    CollectionEnv, QdrantConfig, QdrantIntentSearch, QdrantSearchError, ENV_INTENT_COLLECTION_NAME,
    ENV_QDRANT_INTENT_API_KEY, ENV_QDRANT_INTENT_URL,
};
use serde_json::{json, Value as JsonValue};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/collections/intents/points/search";

fn intents_for(server: &MockServer) -> QdrantIntentSearch {
    QdrantIntentSearch::new(QdrantConfig::new(server.uri(), "intent-key", "intents")).unwrap()
}

async fn mount_hits(server: &MockServer, hits: JsonValue) {
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(header("api-key", "intent-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": hits,
            "status": "ok",
            "time": 0.001
        })))
        .mount(server)
        .await;
}

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    move |name| vars.get(name).cloned()
}

#[tokio::test]
async fn classify_sends_threshold_and_maps_best_match() {
    let server = MockServer::start().await;
    mount_hits(
        &server,
        json!([{
            "id": 7,
            "score": 0.83,
            "payload": {
                "intent_id": 12,
                "title": "Budget",
                "prompt": "Suggest cheaper alternatives",
                "example_queries": ["something cheaper", "on a budget"],
                "required_context": ["budget"]
            }
        }]),
    )
    .await;

    let intents = intents_for(&server)
        .classify(&IntentQuery::new(vec![0.1, 0.2]).with_min_score(0.7))
        .await
        .unwrap();

    assert_eq!(intents.len(), 1);
    let best = &intents[0];
    assert_eq!(best.intent_id, 12);
    assert_eq!(best.title, "Budget");
    assert_eq!(best.prompt, "Suggest cheaper alternatives");
    assert_eq!(best.example_queries, ["something cheaper", "on a budget"]);
    assert_eq!(best.required_context, ["budget"]);
    assert!((best.score - 0.83).abs() < 1e-6);

    let requests = server.received_requests().await.unwrap_or_default();
    let body: JsonValue = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["limit"], json!(1));
    assert_eq!(body["with_payload"], json!(true));
    assert!((body["score_threshold"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert!(body.get("filter").is_none());
}

#[tokio::test]
async fn no_hits_above_threshold_yields_no_intents() {
    let server = MockServer::start().await;
    mount_hits(&server, json!([])).await;

    let intents = intents_for(&server)
        .classify(&IntentQuery::new(vec![0.1]).with_min_score(0.99))
        .await
        .unwrap();

    assert!(intents.is_empty());
}

#[tokio::test]
async fn malformed_intent_hit_is_skipped() {
    let server = MockServer::start().await;
    mount_hits(
        &server,
        json!([
            {"id": "a", "score": 0.9, "payload": {"intent_id": "not-a-number"}},
            {"id": "b", "score": 0.8, "payload": {"intent_id": 3, "title": "Gifts"}}
        ]),
    )
    .await;

    let intents = intents_for(&server)
        .classify(&IntentQuery::new(vec![0.1]).with_limit(2))
        .await
        .unwrap();

    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].title, "Gifts");
}

#[tokio::test]
async fn invalid_query_never_reaches_the_engine() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let search = intents_for(&server);
    let err = IntentSearch::closest_intents(&search, &IntentQuery::new(vec![0.1]).with_limit(0))
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::InvalidRequest(_)));
}

#[tokio::test]
async fn engine_failure_surfaces_as_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"status": {"error": "Collection `intents` not found"}})),
        )
        .mount(&server)
        .await;

    let err = IntentSearch::closest_intents(&intents_for(&server), &IntentQuery::new(vec![0.1]))
        .await
        .unwrap_err();

    let SearchError::Backend(inner) = err else {
        panic!("expected backend error");
    };
    assert!(matches!(
        inner.downcast_ref::<QdrantSearchError>(),
        Some(QdrantSearchError::CollectionNotFound { collection, .. }) if collection == "intents"
    ));
}

#[test]
fn intent_payload_defaults_when_fields_are_missing() {
    let intent = scored_point_to_intent(ScoredPoint {
        id: PointId::Number(1),
        score: 0.4,
        payload: Some(json!({"title": "Gifts"})),
    })
    .unwrap();

    assert_eq!(intent.intent_id, 0);
    assert_eq!(intent.title, "Gifts");
    assert_eq!(intent.prompt, "");
    assert!(intent.example_queries.is_empty());
    assert!(intent.required_context.is_empty());
}

#[test]
fn intent_collection_is_optional_when_unset() {
    let config = QdrantConfig::from_lookup_if_present(
        CollectionEnv::INTENTS,
        lookup(&[("QDRANT_URL", "https://products.example.com")]),
    )
    .unwrap();

    assert!(config.is_none());
}

#[test]
fn partial_intent_configuration_lists_missing_vars() {
    let err = QdrantConfig::from_lookup_if_present(
        CollectionEnv::INTENTS,
        lookup(&[(ENV_QDRANT_INTENT_URL, "intents.example.com")]),
    )
    .unwrap_err();

    match err {
        QdrantSearchError::MissingEnvVars(missing) => {
            assert_eq!(
                missing,
                [ENV_QDRANT_INTENT_API_KEY, ENV_INTENT_COLLECTION_NAME]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn intent_collection_reads_its_own_variables() {
    let config = QdrantConfig::from_lookup_if_present(
        CollectionEnv::INTENTS,
        lookup(&[
            (ENV_QDRANT_INTENT_URL, "intents.example.com/"),
            (ENV_QDRANT_INTENT_API_KEY, "intent-key"),
            (ENV_INTENT_COLLECTION_NAME, "context-prompts"),
            ("QDRANT_URL", "https://products.example.com"),
        ]),
    )
    .unwrap()
    .expect("intent config");

    assert_eq!(config.base_url, "https://intents.example.com");
    assert_eq!(config.api_key, "intent-key");
    assert_eq!(config.collection, "context-prompts");
}
