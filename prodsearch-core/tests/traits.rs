use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use prodsearch_core::{
    Embedding, EmbeddingError, ProductRecord, ProductSearch, SearchError, SearchRequest,
};

struct TestEmbedding;

#[async_trait]
impl Embedding for TestEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![0.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(vec![vec![0.0]; texts.len()])
    }

    fn dimension(&self) -> usize {
        1
    }
}

#[derive(Default)]
struct RecordingSearch {
    limits: Mutex<Vec<usize>>,
}

#[async_trait]
impl ProductSearch for RecordingSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ProductRecord>, SearchError> {
        request.validate()?;
        self.limits.lock().unwrap().push(request.limit);
        Ok((0..request.limit)
            .map(|index| ProductRecord::new(index.to_string(), 1.0 / (index as f32 + 1.0)))
            .collect())
    }
}

fn assert_object_safe(_embedding: Arc<dyn Embedding>) {}

#[test]
fn embedding_trait_is_object_safe() {
    let embedding = Arc::new(TestEmbedding);
    assert_object_safe(embedding);
}

#[tokio::test]
async fn product_search_works_behind_a_trait_object() {
    let concrete = Arc::new(RecordingSearch::default());
    let search: Arc<dyn ProductSearch> = concrete.clone();

    let products = search
        .search(&SearchRequest::new(vec![0.5]).with_limit(2))
        .await
        .unwrap();

    assert_eq!(products.len(), 2);
    assert!(products[0].score >= products[1].score);
    assert_eq!(concrete.limits.lock().unwrap().as_slice(), &[2]);
}

#[tokio::test]
async fn product_search_validation_errors_propagate() {
    let search: Arc<dyn ProductSearch> = Arc::new(RecordingSearch::default());

    let err = search
        .search(&SearchRequest::new(Vec::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::InvalidRequest(_)));
}
