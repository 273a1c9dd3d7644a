use async_trait::async_trait;

use crate::{ProductRecord, SearchError, SearchRequest};

/// A backend able to answer a similarity search with shaped product records.
///
/// Implementations return hits in the backend's ranked order (most similar
/// first) and never more than `request.limit` records.
#[async_trait]
pub trait ProductSearch: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ProductRecord>, SearchError>;
}
