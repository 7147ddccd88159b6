//! Response validation.
//!
//! Turns a raw response body into a typed [`ResultCollection`], so nothing
//! downstream ever sees an untyped payload.

use crate::error::ValidationError;
use crate::models::{ResultCollection, ReviewResult};
use serde_json::Value;
use std::collections::HashSet;

/// Validate a response body and decode it into a result collection.
///
/// The body must be a JSON array of objects, each carrying a finite
/// `compound_score` in [-1.0, 1.0] and the remaining record fields.
/// Invalid scores are rejected, never coerced.
pub fn validate(body: &[u8]) -> Result<ResultCollection, ValidationError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ValidationError::NotAnArray {
                found: json_kind(&other),
            })
        }
    };

    let mut results = Vec::with_capacity(items.len());
    let mut seen_ids = HashSet::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        check_score(index, &item)?;

        let result: ReviewResult =
            serde_json::from_value(item).map_err(|e| ValidationError::InvalidRecord {
                index,
                reason: e.to_string(),
            })?;

        if !seen_ids.insert(result.id) {
            return Err(ValidationError::DuplicateId { id: result.id });
        }

        results.push(result);
    }

    Ok(ResultCollection::new(results))
}

fn check_score(index: usize, item: &Value) -> Result<(), ValidationError> {
    let record = item
        .as_object()
        .ok_or(ValidationError::NotAnObject { index })?;

    let invalid = |reason: String| ValidationError::InvalidScore { index, reason };

    let score = match record.get("compound_score") {
        None | Some(Value::Null) => return Err(invalid("missing".to_string())),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid(format!("{} is not representable", n)))?,
        Some(other) => return Err(invalid(format!("expected a number, got {}", json_kind(other)))),
    };

    if !(-1.0..=1.0).contains(&score) {
        return Err(invalid(format!("{} is outside [-1.0, 1.0]", score)));
    }

    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
