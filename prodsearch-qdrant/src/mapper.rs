use std::fmt;

use prodsearch_core::product::price;
use prodsearch_core::{value_type_name, IntentMatch, ProductRecord, DEFAULT_CURRENCY};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::QdrantSearchError;

#[derive(Debug, Clone, Serialize)]
pub struct SearchPointsRequest {
    pub vector: Vec<f32>,
    pub limit: usize,
    pub with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub struct CollectionsList {
    pub collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionDescription {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPoint {
    pub id: PointId,
    pub score: f32,
    #[serde(default)]
    pub payload: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    String(String),
    Number(u64),
}

impl PointId {
    pub fn as_string(&self) -> String {
        match self {
            PointId::String(value) => value.clone(),
            PointId::Number(value) => value.to_string(),
        }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::String(value) => f.write_str(value),
            PointId::Number(value) => write!(f, "{value}"),
        }
    }
}

/// Shapes one hit into a [`ProductRecord`].
///
/// `id` and `score` come from the hit itself. Recognised payload fields fill
/// the record (with the `title`, `image` and `link` aliases read only when
/// the canonical field is absent), and everything else lands in `metadata`.
/// A missing payload yields a record of defaults; a payload that is not an
/// object, or a recognised field with the wrong type, is an error for this
/// hit only.
pub fn scored_point_to_product(point: ScoredPoint) -> Result<ProductRecord, QdrantSearchError> {
    let point_id = point.id.as_string();
    let mut record = ProductRecord::new(point_id.clone(), point.score);

    let mut payload = match point.payload {
        None | Some(JsonValue::Null) => return Ok(record),
        Some(JsonValue::Object(payload)) => payload,
        Some(other) => {
            return Err(QdrantSearchError::InvalidPayload {
                point_id,
                reason: format!("expected an object payload, got {}", value_type_name(&other)),
            })
        }
    };

    let mut fields = PayloadFields {
        point_id: &point_id,
        payload: &mut payload,
    };

    record.name = fields.string_or("name", "title")?.unwrap_or_default();
    record.description = fields.string("description")?.unwrap_or_default();
    record.price = fields.price()?.unwrap_or_default();
    record.currency = fields
        .string("currency")?
        .filter(|currency| !currency.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    record.image_url = fields.string_or("image_url", "image")?.unwrap_or_default();
    record.product_url = fields.string_or("product_url", "link")?.unwrap_or_default();

    record.brand = fields.string("brand")?;
    record.category = fields.string("category")?;
    record.tags = fields.typed("tags")?;
    record.variants = fields.typed("variants")?;
    record.ingredients = fields.typed("ingredients")?;
    record.nutritional_info = fields.typed("nutritional_info")?;
    record.allergens = fields.typed("allergens")?;
    record.dietary_info = fields.typed("dietary_info")?;
    record.rating = fields.typed("rating")?;
    record.review_count = fields.typed("review_count")?;

    let explicit: Option<JsonMap<String, JsonValue>> = fields.typed("metadata")?;
    record.metadata = merge_metadata(explicit, payload);

    Ok(record)
}

/// Shapes one hit from the intent collection. Absent fields take their
/// defaults; a field of the wrong type fails this hit only.
pub fn scored_point_to_intent(point: ScoredPoint) -> Result<IntentMatch, QdrantSearchError> {
    let point_id = point.id.as_string();
    let mut intent = IntentMatch {
        score: point.score,
        ..IntentMatch::default()
    };

    let mut payload = match point.payload {
        None | Some(JsonValue::Null) => return Ok(intent),
        Some(JsonValue::Object(payload)) => payload,
        Some(other) => {
            return Err(QdrantSearchError::InvalidPayload {
                point_id,
                reason: format!("expected an object payload, got {}", value_type_name(&other)),
            })
        }
    };

    let mut fields = PayloadFields {
        point_id: &point_id,
        payload: &mut payload,
    };

    intent.intent_id = fields.typed("intent_id")?.unwrap_or_default();
    intent.title = fields.string("title")?.unwrap_or_default();
    intent.prompt = fields.string("prompt")?.unwrap_or_default();
    intent.example_queries = fields.typed("example_queries")?.unwrap_or_default();
    intent.required_context = fields.typed("required_context")?.unwrap_or_default();

    Ok(intent)
}

struct PayloadFields<'a> {
    point_id: &'a str,
    payload: &'a mut JsonMap<String, JsonValue>,
}

impl PayloadFields<'_> {
    fn invalid(&self, key: &str, reason: impl fmt::Display) -> QdrantSearchError {
        QdrantSearchError::InvalidPayload {
            point_id: self.point_id.to_string(),
            reason: format!("field '{key}': {reason}"),
        }
    }

    /// Removes `key`; an explicit null counts as absent.
    fn take(&mut self, key: &str) -> Option<JsonValue> {
        self.payload.remove(key).filter(|value| !value.is_null())
    }

    fn string(&mut self, key: &str) -> Result<Option<String>, QdrantSearchError> {
        match self.take(key) {
            None => Ok(None),
            Some(JsonValue::String(value)) => Ok(Some(value)),
            Some(other) => Err(self.invalid(
                key,
                format_args!("expected a string, got {}", value_type_name(&other)),
            )),
        }
    }

    /// Reads `fallback` only when `key` is absent, so an unused fallback
    /// stays in the payload untouched.
    fn string_or(
        &mut self,
        key: &str,
        fallback: &str,
    ) -> Result<Option<String>, QdrantSearchError> {
        match self.string(key)? {
            Some(value) => Ok(Some(value)),
            None => self.string(fallback),
        }
    }

    fn price(&mut self) -> Result<Option<f64>, QdrantSearchError> {
        self.take("price")
            .map(|value| price::parse(&value).map_err(|reason| self.invalid("price", reason)))
            .transpose()
    }

    fn typed<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, QdrantSearchError> {
        self.take(key)
            .map(|value| serde_json::from_value(value).map_err(|err| self.invalid(key, err)))
            .transpose()
    }
}

/// Explicit `metadata` entries win over unrecognised top-level keys.
fn merge_metadata(
    explicit: Option<JsonMap<String, JsonValue>>,
    extra: JsonMap<String, JsonValue>,
) -> Option<JsonMap<String, JsonValue>> {
    let mut merged = explicit.unwrap_or_default();
    for (key, value) in extra {
        merged.entry(key).or_insert(value);
    }

    (!merged.is_empty()).then_some(merged)
}
