use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::{value_type_name, JsonMap, Value};
use crate::SearchError;

/// Numeric bounds on a payload field. At least one bound must be set.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<f64>,
}

impl NumericRange {
    pub fn is_unbounded(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }
}

/// One condition on a payload field. All conditions of a request are ANDed.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldFilter {
    /// Exact match on a scalar (string, integer, boolean or float).
    Exact(Value),
    /// Field equals any of the values.
    AnyOf(Vec<Value>),
    /// Field equals none of the values.
    Except(Vec<Value>),
    Range(NumericRange),
    /// Full-text match against a text-indexed field.
    Text(String),
    /// Geo point within `radius` metres of the centre.
    GeoRadius { lat: f64, lon: f64, radius: f64 },
}

impl FieldFilter {
    pub fn exact(value: impl Into<Value>) -> Self {
        FieldFilter::Exact(value.into())
    }

    /// Interprets a filter value as received over the wire.
    ///
    /// Scalars are exact matches and arrays are match-any. Objects carry a
    /// single operator: `not`, `range`, `text` or `geo`.
    pub fn from_json(key: &str, value: Value) -> Result<Self, SearchError> {
        let invalid = |reason: String| SearchError::InvalidFilter {
            key: key.to_string(),
            reason,
        };

        match value {
            Value::Null => Err(invalid("null cannot be matched".to_string())),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(FieldFilter::Exact(value)),
            Value::Array(values) => {
                if values.is_empty() {
                    return Err(invalid(
                        "match-any requires at least one value".to_string(),
                    ));
                }
                Ok(FieldFilter::AnyOf(values))
            }
            Value::Object(object) => {
                if object.len() != 1 {
                    return Err(invalid(format!(
                        "filter object must carry exactly one operator, got {}",
                        object.len()
                    )));
                }

                let Some((operator, operand)) = object.into_iter().next() else {
                    return Err(invalid("filter object is empty".to_string()));
                };

                match operator.as_str() {
                    "not" => {
                        let values = match operand {
                            Value::Array(values) => values,
                            Value::Null => {
                                return Err(invalid("not(...) cannot exclude null".to_string()))
                            }
                            scalar => vec![scalar],
                        };
                        if values.is_empty() {
                            return Err(invalid(
                                "not(...) requires at least one value".to_string(),
                            ));
                        }
                        Ok(FieldFilter::Except(values))
                    }
                    "range" => parse_range(operand).map(FieldFilter::Range).map_err(invalid),
                    "text" => match operand {
                        Value::String(text) if !text.trim().is_empty() => {
                            Ok(FieldFilter::Text(text))
                        }
                        Value::String(_) => Err(invalid("text match cannot be blank".to_string())),
                        other => Err(invalid(format!(
                            "text match expects a string, got {}",
                            value_type_name(&other)
                        ))),
                    },
                    "geo" => parse_geo(operand).map_err(invalid),
                    other => Err(invalid(format!("unsupported filter operator '{other}'"))),
                }
            }
        }
    }
}

impl From<&str> for FieldFilter {
    fn from(value: &str) -> Self {
        FieldFilter::exact(value)
    }
}

impl From<String> for FieldFilter {
    fn from(value: String) -> Self {
        FieldFilter::exact(value)
    }
}

impl From<i64> for FieldFilter {
    fn from(value: i64) -> Self {
        FieldFilter::exact(value)
    }
}

impl From<bool> for FieldFilter {
    fn from(value: bool) -> Self {
        FieldFilter::exact(value)
    }
}

fn parse_range(operand: Value) -> Result<NumericRange, String> {
    let Value::Object(bounds) = operand else {
        return Err(format!(
            "range expects an object of bounds, got {}",
            value_type_name(&operand)
        ));
    };

    let mut range = NumericRange::default();
    for (bound, value) in bounds {
        let number = finite_number(&bound, &value)?;
        match bound.as_str() {
            "gt" => range.gt = Some(number),
            "gte" => range.gte = Some(number),
            "lt" => range.lt = Some(number),
            "lte" => range.lte = Some(number),
            other => return Err(format!("unsupported range bound '{other}'")),
        }
    }

    if range.is_unbounded() {
        return Err("range requires at least one numeric bound".to_string());
    }

    Ok(range)
}

fn parse_geo(operand: Value) -> Result<FieldFilter, String> {
    let Value::Object(geo) = operand else {
        return Err(format!(
            "geo expects an object with lat, lon and radius, got {}",
            value_type_name(&operand)
        ));
    };

    let field = |name: &str| -> Result<f64, String> {
        let value = geo
            .get(name)
            .ok_or_else(|| format!("geo filter is missing '{name}'"))?;
        finite_number(name, value)
    };

    let lat = field("lat")?;
    let lon = field("lon")?;
    let radius = field("radius")?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("geo latitude {lat} is out of range"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("geo longitude {lon} is out of range"));
    }
    if radius <= 0.0 {
        return Err("geo radius must be positive".to_string());
    }

    Ok(FieldFilter::GeoRadius { lat, lon, radius })
}

fn finite_number(name: &str, value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .filter(|number| number.is_finite())
        .ok_or_else(|| format!("'{name}' must be a finite number"))
}

/// A similarity search against the product collection.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    pub vector: Vec<f32>,
    pub limit: usize,
    /// Tenant scope, matched against the reserved `client_id` payload field.
    pub client_id: Option<String>,
    /// Additional conditions keyed by payload field name.
    pub filters: BTreeMap<String, FieldFilter>,
}

impl SearchRequest {
    pub const DEFAULT_LIMIT: usize = 5;

    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            limit: Self::DEFAULT_LIMIT,
            client_id: None,
            filters: BTreeMap::new(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, filter: impl Into<FieldFilter>) -> Self {
        self.filters.insert(key.into(), filter.into());
        self
    }

    /// Adds every entry of a wire-format filter map, rejecting the first invalid one.
    pub fn with_json_filters(mut self, filters: JsonMap) -> Result<Self, SearchError> {
        for (key, value) in filters {
            let filter = FieldFilter::from_json(&key, value)?;
            self.filters.insert(key, filter);
        }
        Ok(self)
    }

    pub fn is_filtered(&self) -> bool {
        self.client_id.is_some() || !self.filters.is_empty()
    }

    /// Checks what can be checked without the backend.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.vector.is_empty() {
            return Err(SearchError::InvalidRequest(
                "query vector must not be empty".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(SearchError::InvalidRequest(
                "limit must be greater than 0".to_string(),
            ));
        }
        if let Some(position) = self.vector.iter().position(|value| !value.is_finite()) {
            return Err(SearchError::InvalidRequest(format!(
                "query vector component {position} is not finite"
            )));
        }
        Ok(())
    }
}
