use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::{string_or_number, JsonMap};

pub const DEFAULT_CURRENCY: &str = "USD";

/// A search hit shaped into the fixed product schema handed to consumers.
///
/// `id` and `score` always come from the search engine's hit metadata.
/// Every other field is taken from the stored payload, with a default when
/// the payload does not carry it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub product_url: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<ProductVariant>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergens: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_info: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
}

impl ProductRecord {
    /// A record carrying only the hit identity; every payload field at its default.
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            price: 0.0,
            currency: default_currency(),
            image_url: String::new(),
            product_url: String::new(),
            score,
            brand: None,
            category: None,
            tags: None,
            variants: None,
            ingredients: None,
            nutritional_info: None,
            allergens: None,
            dietary_info: None,
            rating: None,
            review_count: None,
            metadata: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProductVariant {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(deserialize_with = "price::deserialize")]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_info: Option<ShippingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<JsonMap>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ShippingInfo {
    /// Grams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Centimetres, keyed by `length`, `width`, `height`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub free_shipping: bool,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_in_stock() -> bool {
    true
}

/// Prices are stored either as JSON numbers or as numeric strings (`"4.99"`).
pub mod price {
    use serde::{Deserialize, Deserializer};

    use crate::value::{value_type_name, Value};

    pub fn parse(value: &Value) -> Result<f64, String> {
        let price = match value {
            Value::Number(number) => number
                .as_f64()
                .ok_or_else(|| format!("price {number} is not representable as f64"))?,
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("price '{text}' is not numeric"))?,
            other => {
                return Err(format!(
                    "price must be a number or numeric string, got {}",
                    value_type_name(other)
                ))
            }
        };

        if price.is_finite() {
            Ok(price)
        } else {
            Err(format!("price must be finite, got {price}"))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        parse(&value).map_err(serde::de::Error::custom)
    }
}
