use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use prodsearch_core::{
    Embedding, EmbeddingError, ProductRecord, ProductSearch, SearchError, SearchRequest,
};
use prodsearch_server::{app_router, AppState, ServerConfig, StorefrontProduct};
use serde_json::{json, Value};
use tower::ServiceExt;

struct FixedEmbedding {
    result: Result<Vec<f32>, String>,
}

#[async_trait]
impl Embedding for FixedEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.result.clone().map_err(EmbeddingError::Provider)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        3
    }
}

#[derive(Default)]
struct RecordingSearch {
    products: Vec<ProductRecord>,
    fail: bool,
    seen: Mutex<Vec<SearchRequest>>,
}

#[async_trait]
impl ProductSearch for RecordingSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ProductRecord>, SearchError> {
        self.seen.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(SearchError::Backend("qdrant is down".into()));
        }
        Ok(self.products.iter().take(request.limit).cloned().collect())
    }
}

fn product(id: &str, name: &str, price: f64, currency: &str, score: f32) -> ProductRecord {
    let mut product = ProductRecord::new(id, score);
    product.name = name.to_string();
    product.price = price;
    product.currency = currency.to_string();
    product.description = format!("{name} description");
    product.image_url = format!("https://cdn.example.com/{id}.png");
    product.product_url = format!("/products/{id}");
    product
}

fn app(search: Arc<RecordingSearch>, embedding: FixedEmbedding) -> Router {
    app_with_fallback(search, embedding, Vec::new())
}

fn app_with_fallback(
    search: Arc<RecordingSearch>,
    embedding: FixedEmbedding,
    fallback: Vec<StorefrontProduct>,
) -> Router {
    let state = AppState::new(search, Arc::new(embedding)).with_fallback(fallback);
    app_router(state, &ServerConfig::default())
}

fn working_embedder() -> FixedEmbedding {
    FixedEmbedding {
        result: Ok(vec![0.1, 0.2, 0.3]),
    }
}

async fn post_recommend(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recommend")
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

#[tokio::test]
async fn health_reports_ok() {
    let app = app(Arc::default(), working_embedder());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn recommend_returns_storefront_products() {
    let search = Arc::new(RecordingSearch {
        products: vec![
            product("p-1", "Avocados", 4.99, "USD", 0.91),
            product("p-2", "Yogurt", 3.5, "eur", 0.72),
        ],
        ..RecordingSearch::default()
    });

    let (status, body) = post_recommend(
        app(search.clone(), working_embedder()),
        json!({"query": "  healthy breakfast  "}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(
        body[0],
        json!({
            "id": "p-1",
            "title": "Avocados",
            "price": "4.99",
            "description": "Avocados description",
            "image": "https://cdn.example.com/p-1.png",
            "link": "/products/p-1",
            "formattedPrice": "$4.99",
            "score": body[0]["score"]
        })
    );
    let score = body[0]["score"].as_f64().unwrap();
    assert!((score - 0.91).abs() < 1e-6);
    assert_eq!(body[1]["price"], json!("3.50"));
    assert_eq!(body[1]["formattedPrice"], json!("3.50 EUR"));

    let seen = search.seen.lock().unwrap();
    assert_eq!(seen[0].limit, 3);
    assert_eq!(seen[0].vector, vec![0.1, 0.2, 0.3]);
    assert!(!seen[0].is_filtered());
}

#[tokio::test]
async fn recommend_forwards_client_and_filters() {
    let search = Arc::new(RecordingSearch::default());

    let (status, _) = post_recommend(
        app(search.clone(), working_embedder()),
        json!({
            "query": "snacks",
            "limit": 5,
            "client_id": "acme",
            "filters": {"category": "snacks", "price": {"range": {"lte": 10}}}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let seen = search.seen.lock().unwrap();
    assert_eq!(seen[0].limit, 5);
    assert_eq!(seen[0].client_id.as_deref(), Some("acme"));
    assert_eq!(seen[0].filters.len(), 2);
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let search = Arc::new(RecordingSearch::default());

    let (status, body) =
        post_recommend(app(search.clone(), working_embedder()), json!({"query": "   "})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("blank"));
    assert!(search.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_filter_is_rejected_before_searching() {
    let search = Arc::new(RecordingSearch::default());

    let (status, body) = post_recommend(
        app(search.clone(), working_embedder()),
        json!({"query": "snacks", "filters": {"price": {"range": {}}}}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("price"));
    assert!(search.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn search_failure_is_a_bad_gateway() {
    let search = Arc::new(RecordingSearch {
        fail: true,
        ..RecordingSearch::default()
    });

    let (status, body) =
        post_recommend(app(search, working_embedder()), json!({"query": "snacks"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], json!("product search is unavailable"));
}

#[tokio::test]
async fn embedding_failure_is_a_bad_gateway() {
    let search = Arc::new(RecordingSearch::default());
    let embedder = FixedEmbedding {
        result: Err("openai unavailable".to_string()),
    };

    let (status, _) =
        post_recommend(app(search.clone(), embedder), json!({"query": "snacks"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(search.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_results_fall_back_to_catalogue() {
    let fallback = vec![StorefrontProduct {
        id: "1".to_string(),
        title: "Organic Fresh Avocados".to_string(),
        price: "4.99".to_string(),
        description: "Hand-picked".to_string(),
        image: "https://images.example.com/avocado.jpg".to_string(),
        link: "/products/organic-avocados".to_string(),
        formatted_price: Some("$4.99".to_string()),
        score: None,
    }];

    let (status, body) = post_recommend(
        app_with_fallback(Arc::default(), working_embedder(), fallback),
        json!({"query": "avocado"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["title"], json!("Organic Fresh Avocados"));
    assert!(body[0].get("score").is_none());
}

#[tokio::test]
async fn empty_results_without_catalogue_are_empty() {
    let (status, body) =
        post_recommend(app(Arc::default(), working_embedder()), json!({"query": "caviar"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let (status, _) = post_recommend(
        app(Arc::default(), working_embedder()),
        json!({"query": "x".repeat(70 * 1024)}),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
