//! Translation of [`SearchRequest`] conditions into Qdrant payload filters.
//!
//! Conditions are built as typed `qdrant_client` values first and then
//! rendered to the JSON shape the REST search endpoint accepts.

use std::collections::BTreeMap;

use prodsearch_core::{FieldFilter, NumericRange, SearchRequest};
use qdrant_client::qdrant::{
    condition, r#match, Condition, FieldCondition, Filter, GeoPoint, GeoRadius, Match, Range,
    RepeatedIntegers, RepeatedStrings,
};
use serde_json::{Map as JsonMap, Value};

use crate::QdrantSearchError;

/// Reserved payload field that scopes products to a tenant.
pub const CLIENT_ID_FIELD: &str = "client_id";

/// Builds the filter for a request, or `None` when it has no conditions.
pub fn request_filter(request: &SearchRequest) -> Result<Option<Filter>, QdrantSearchError> {
    build_search_filter(request.client_id.as_deref(), &request.filters)
}

/// The tenant condition comes first, then field conditions in key order,
/// all under `must`.
pub fn build_search_filter(
    client_id: Option<&str>,
    filters: &BTreeMap<String, FieldFilter>,
) -> Result<Option<Filter>, QdrantSearchError> {
    if client_id.is_none() && filters.is_empty() {
        return Ok(None);
    }

    let mut must = Vec::with_capacity(filters.len() + 1);
    if let Some(client_id) = client_id {
        must.push(field(keyword_field(CLIENT_ID_FIELD, client_id)));
    }
    for (key, filter) in filters {
        must.push(field_condition(key, filter)?);
    }

    Ok(Some(Filter {
        must,
        ..Filter::default()
    }))
}

pub fn qdrant_filter_to_payload(filter: &Filter) -> Result<Value, QdrantSearchError> {
    filter_payload(filter)
}

fn field_condition(key: &str, filter: &FieldFilter) -> Result<Condition, QdrantSearchError> {
    let field_condition = match filter {
        FieldFilter::Exact(value) => eq_field(key, value)?,
        FieldFilter::AnyOf(values) => any_field(key, values)?,
        FieldFilter::Except(values) => except_field(key, values)?,
        FieldFilter::Range(range) => range_field(key, range)?,
        FieldFilter::Text(text) => match_field(key, r#match::MatchValue::Text(text.clone())),
        FieldFilter::GeoRadius { lat, lon, radius } => geo_field(key, *lat, *lon, *radius)?,
    };

    Ok(field(field_condition))
}

fn field(field: FieldCondition) -> Condition {
    Condition {
        condition_one_of: Some(condition::ConditionOneOf::Field(field)),
    }
}

fn match_field(key: &str, value: r#match::MatchValue) -> FieldCondition {
    FieldCondition {
        key: key.to_string(),
        r#match: Some(Match {
            match_value: Some(value),
        }),
        ..FieldCondition::default()
    }
}

fn keyword_field(key: &str, value: &str) -> FieldCondition {
    match_field(key, r#match::MatchValue::Keyword(value.to_string()))
}

fn unsupported(key: &str, reason: impl Into<String>) -> QdrantSearchError {
    QdrantSearchError::UnsupportedFilterValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn eq_field(key: &str, value: &Value) -> Result<FieldCondition, QdrantSearchError> {
    match value {
        Value::Bool(value) => Ok(match_field(key, r#match::MatchValue::Boolean(*value))),
        Value::String(value) => Ok(keyword_field(key, value)),
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                Ok(match_field(key, r#match::MatchValue::Integer(value)))
            } else if let Some(value) = number.as_u64() {
                let value = u64_to_i64(key, "eq", value)?;
                Ok(match_field(key, r#match::MatchValue::Integer(value)))
            } else {
                // Qdrant has no float match, so equality is a closed range.
                let eq = json_number_to_f64(key, "eq", value)?;
                Ok(FieldCondition {
                    key: key.to_string(),
                    range: Some(Range {
                        gte: Some(eq),
                        lte: Some(eq),
                        ..Range::default()
                    }),
                    ..FieldCondition::default()
                })
            }
        }
        Value::Null => Err(unsupported(
            key,
            "null is not supported by Qdrant payload filters",
        )),
        Value::Array(_) => Err(unsupported(
            key,
            "array equality is not supported by Qdrant payload filters",
        )),
        Value::Object(_) => Err(unsupported(
            key,
            "object equality is not supported by Qdrant payload filters",
        )),
    }
}

enum Homogeneous {
    Strings(Vec<String>),
    Integers(Vec<i64>),
}

fn homogeneous(key: &str, op: &str, values: &[Value]) -> Result<Homogeneous, QdrantSearchError> {
    if values.is_empty() {
        return Err(unsupported(key, format!("{op}(...) requires at least one value")));
    }

    if let Some(strings) = values
        .iter()
        .map(|value| value.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
    {
        return Ok(Homogeneous::Strings(strings));
    }

    let integers = values
        .iter()
        .map(|value| match (value.as_i64(), value.as_u64()) {
            (Some(value), _) => Some(Ok(value)),
            (None, Some(value)) => Some(u64_to_i64(key, op, value)),
            (None, None) => None,
        })
        .collect::<Option<Result<Vec<_>, _>>>();

    match integers {
        Some(integers) => Ok(Homogeneous::Integers(integers?)),
        None => Err(unsupported(
            key,
            format!(
                "{op}(...) supports only homogeneous string or int64 values \
                 in Qdrant payload filters"
            ),
        )),
    }
}

fn any_field(key: &str, values: &[Value]) -> Result<FieldCondition, QdrantSearchError> {
    let value = match homogeneous(key, "any", values)? {
        Homogeneous::Strings(strings) => {
            r#match::MatchValue::Keywords(RepeatedStrings { strings })
        }
        Homogeneous::Integers(integers) => {
            r#match::MatchValue::Integers(RepeatedIntegers { integers })
        }
    };
    Ok(match_field(key, value))
}

fn except_field(key: &str, values: &[Value]) -> Result<FieldCondition, QdrantSearchError> {
    let value = match homogeneous(key, "not", values)? {
        Homogeneous::Strings(strings) => {
            r#match::MatchValue::ExceptKeywords(RepeatedStrings { strings })
        }
        Homogeneous::Integers(integers) => {
            r#match::MatchValue::ExceptIntegers(RepeatedIntegers { integers })
        }
    };
    Ok(match_field(key, value))
}

fn u64_to_i64(key: &str, op: &str, value: u64) -> Result<i64, QdrantSearchError> {
    i64::try_from(value).map_err(|_| {
        unsupported(
            key,
            format!("{op} value must fit int64; u64 value exceeds i64::MAX: {value}"),
        )
    })
}

fn range_field(key: &str, range: &NumericRange) -> Result<FieldCondition, QdrantSearchError> {
    if range.is_unbounded() {
        return Err(unsupported(key, "range requires at least one numeric bound"));
    }

    let bounds = [range.gt, range.gte, range.lt, range.lte];
    if bounds.iter().flatten().any(|bound| !bound.is_finite()) {
        return Err(unsupported(key, "range bound/value must be a finite number"));
    }

    Ok(FieldCondition {
        key: key.to_string(),
        range: Some(Range {
            gt: range.gt,
            gte: range.gte,
            lt: range.lt,
            lte: range.lte,
            ..Range::default()
        }),
        ..FieldCondition::default()
    })
}

fn geo_field(
    key: &str,
    lat: f64,
    lon: f64,
    radius: f64,
) -> Result<FieldCondition, QdrantSearchError> {
    if !(lat.is_finite() && lon.is_finite() && radius.is_finite()) || radius <= 0.0 {
        return Err(unsupported(
            key,
            "geo radius requires a finite centre and a positive radius",
        ));
    }

    Ok(FieldCondition {
        key: key.to_string(),
        geo_radius: Some(GeoRadius {
            center: Some(GeoPoint { lon, lat }),
            radius: radius as f32,
        }),
        ..FieldCondition::default()
    })
}

fn json_number_to_f64(key: &str, op: &str, value: &Value) -> Result<f64, QdrantSearchError> {
    value
        .as_f64()
        .filter(|number| number.is_finite())
        .ok_or_else(|| unsupported(key, format!("{op} bound/value must be a finite number")))
}

fn filter_payload(filter: &Filter) -> Result<Value, QdrantSearchError> {
    let mut out = JsonMap::new();

    for (name, conditions) in [
        ("must", &filter.must),
        ("should", &filter.should),
        ("must_not", &filter.must_not),
    ] {
        if conditions.is_empty() {
            continue;
        }
        let rendered = conditions
            .iter()
            .map(condition_payload)
            .collect::<Result<Vec<_>, _>>()?;
        out.insert(name.to_string(), Value::Array(rendered));
    }

    Ok(Value::Object(out))
}

fn condition_payload(condition: &Condition) -> Result<Value, QdrantSearchError> {
    match condition.condition_one_of.as_ref() {
        Some(condition::ConditionOneOf::Field(field)) => field_payload(field),
        Some(condition::ConditionOneOf::Filter(filter)) => filter_payload(filter),
        _ => Err(unsupported(
            "<condition>",
            "unsupported qdrant condition generated",
        )),
    }
}

fn field_payload(field: &FieldCondition) -> Result<Value, QdrantSearchError> {
    let mut out = JsonMap::new();
    out.insert("key".to_string(), Value::String(field.key.clone()));

    if let Some(r#match) = field.r#match.as_ref() {
        out.insert("match".to_string(), match_payload(&field.key, r#match)?);
    }

    if let Some(range) = field.range.as_ref() {
        let mut range_payload = JsonMap::new();
        for (name, bound) in [
            ("gt", range.gt),
            ("gte", range.gte),
            ("lt", range.lt),
            ("lte", range.lte),
        ] {
            if let Some(bound) = bound {
                range_payload.insert(name.to_string(), Value::from(bound));
            }
        }
        out.insert("range".to_string(), Value::Object(range_payload));
    }

    if let Some(geo) = field.geo_radius.as_ref() {
        let center = geo
            .center
            .as_ref()
            .ok_or_else(|| unsupported(&field.key, "geo radius is missing its centre"))?;

        let mut geo_payload = JsonMap::new();
        let mut center_payload = JsonMap::new();
        center_payload.insert("lon".to_string(), Value::from(center.lon));
        center_payload.insert("lat".to_string(), Value::from(center.lat));
        geo_payload.insert("center".to_string(), Value::Object(center_payload));
        geo_payload.insert("radius".to_string(), Value::from(f64::from(geo.radius)));
        out.insert("geo_radius".to_string(), Value::Object(geo_payload));
    }

    Ok(Value::Object(out))
}

fn match_payload(key: &str, r#match: &Match) -> Result<Value, QdrantSearchError> {
    let strings = |values: &RepeatedStrings| {
        Value::Array(values.strings.iter().cloned().map(Value::String).collect())
    };
    let integers = |values: &RepeatedIntegers| {
        Value::Array(values.integers.iter().copied().map(Value::from).collect())
    };

    let (name, value) = match r#match.match_value.as_ref() {
        Some(r#match::MatchValue::Keyword(value)) => ("value", Value::String(value.clone())),
        Some(r#match::MatchValue::Integer(value)) => ("value", Value::from(*value)),
        Some(r#match::MatchValue::Boolean(value)) => ("value", Value::Bool(*value)),
        Some(r#match::MatchValue::Text(value)) => ("text", Value::String(value.clone())),
        Some(r#match::MatchValue::Keywords(values)) => ("any", strings(values)),
        Some(r#match::MatchValue::Integers(values)) => ("any", integers(values)),
        Some(r#match::MatchValue::ExceptKeywords(values)) => ("except", strings(values)),
        Some(r#match::MatchValue::ExceptIntegers(values)) => ("except", integers(values)),
        _ => {
            return Err(unsupported(
                key,
                "unsupported qdrant match variant generated",
            ));
        }
    };

    let mut out = JsonMap::new();
    out.insert(name.to_string(), value);
    Ok(Value::Object(out))
}
