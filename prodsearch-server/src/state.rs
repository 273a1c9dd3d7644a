use std::sync::Arc;

use prodsearch_core::{Embedding, IntentSearch, ProductSearch};

use crate::storefront::StorefrontProduct;

/// Shared handles, built once at startup and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<dyn ProductSearch>,
    pub embedder: Arc<dyn Embedding>,
    pub fallback: Arc<[StorefrontProduct]>,
    /// Absent when no intent collection is configured.
    pub intents: Option<Arc<dyn IntentSearch>>,
}

impl AppState {
    pub fn new(search: Arc<dyn ProductSearch>, embedder: Arc<dyn Embedding>) -> Self {
        Self {
            search,
            embedder,
            fallback: Arc::from(Vec::new()),
            intents: None,
        }
    }

    pub fn with_fallback(mut self, products: Vec<StorefrontProduct>) -> Self {
        self.fallback = Arc::from(products);
        self
    }

    pub fn with_intents(mut self, intents: Arc<dyn IntentSearch>) -> Self {
        self.intents = Some(intents);
        self
    }
}
