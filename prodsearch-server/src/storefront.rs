//! The flattened product shape the storefront frontend renders.

use std::path::Path;

use anyhow::Context;
use prodsearch_core::{ProductRecord, DEFAULT_CURRENCY};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontProduct {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Decimal string with two fraction digits, e.g. `"4.99"`.
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl From<ProductRecord> for StorefrontProduct {
    fn from(product: ProductRecord) -> Self {
        Self {
            formatted_price: Some(format_price(product.price, &product.currency)),
            price: format!("{:.2}", product.price),
            id: product.id,
            title: product.name,
            description: product.description,
            image: product.image_url,
            link: product.product_url,
            score: Some(product.score),
        }
    }
}

pub fn format_price(price: f64, currency: &str) -> String {
    if currency.eq_ignore_ascii_case(DEFAULT_CURRENCY) {
        format!("${price:.2}")
    } else {
        format!("{price:.2} {}", currency.to_ascii_uppercase())
    }
}

/// Loads a fallback catalogue; entries without `formattedPrice` get a
/// dollar-prefixed one derived from `price`.
pub fn load_catalogue(path: &Path) -> anyhow::Result<Vec<StorefrontProduct>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fallback catalogue {}", path.display()))?;
    let mut products: Vec<StorefrontProduct> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid fallback catalogue {}", path.display()))?;

    for product in &mut products {
        if product.formatted_price.is_none() {
            product.formatted_price = Some(format!("${}", product.price));
        }
    }

    Ok(products)
}
