//! Shared product-search types for prodsearch.
//!
//! The search backends and the embedding provider meet here: all are traits
//! ([`ProductSearch`], [`IntentSearch`], [`Embedding`]) so the HTTP layer
//! never depends on a concrete vector database or model vendor.

mod embedding;
mod error;
mod intent;
pub mod product;
mod request;
mod retry;
mod search;
mod value;

pub use embedding::Embedding;
pub use error::{EmbeddingError, SearchError};
pub use intent::{IntentMatch, IntentQuery, IntentSearch, GENERIC_INTENT_TITLE};
pub use product::{ProductRecord, ProductVariant, ShippingInfo, DEFAULT_CURRENCY};
pub use request::{FieldFilter, NumericRange, SearchRequest};
pub use retry::{is_retryable, RetryPolicy, Retrying};
pub use search::ProductSearch;
pub use value::{value_type_name, JsonMap, Value};
