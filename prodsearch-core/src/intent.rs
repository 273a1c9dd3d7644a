use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::SearchError;

/// Title of the intent returned when nothing clears the similarity threshold.
pub const GENERIC_INTENT_TITLE: &str = "Generic";

/// A similarity query against a collection of intent prompts.
#[derive(Clone, Debug, PartialEq)]
pub struct IntentQuery {
    pub vector: Vec<f32>,
    pub limit: usize,
    /// Hits scoring below this are dropped by the backend.
    pub min_score: Option<f32>,
}

impl IntentQuery {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            limit: 1,
            min_score: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.vector.is_empty() {
            return Err(SearchError::InvalidRequest(
                "query vector cannot be empty".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(SearchError::InvalidRequest(
                "limit must be greater than 0".to_string(),
            ));
        }
        if self.min_score.is_some_and(|score| !score.is_finite()) {
            return Err(SearchError::InvalidRequest(
                "similarity threshold must be a finite number".to_string(),
            ));
        }
        Ok(())
    }
}

/// A stored intent prompt matched by a query.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct IntentMatch {
    pub intent_id: i64,
    pub title: String,
    pub prompt: String,
    pub example_queries: Vec<String>,
    pub required_context: Vec<String>,
    pub score: f32,
}

impl IntentMatch {
    pub fn generic() -> Self {
        Self {
            intent_id: 0,
            title: GENERIC_INTENT_TITLE.to_string(),
            prompt: "Generic response".to_string(),
            ..Self::default()
        }
    }
}

/// A backend that ranks stored intents by similarity to a query vector.
///
/// Matches come back best first, never more than `query.limit` of them and
/// none below `query.min_score`.
#[async_trait]
pub trait IntentSearch: Send + Sync {
    async fn closest_intents(&self, query: &IntentQuery) -> Result<Vec<IntentMatch>, SearchError>;
}
