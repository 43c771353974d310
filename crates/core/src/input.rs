//! Coercion and validation of loosely-typed request fields.
//!
//! Clients send numeric fields either as JSON numbers or as the raw string a
//! form input produced, and older clients sent `isbn` as a number. The types
//! here accept those shapes and the helpers turn them into the single typed
//! representation the stores persist.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Highest accepted rating.
pub const MAX_RATING: i32 = 5;

/// A number sent either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NumberInput {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for NumberInput {
    fn from(value: i64) -> Self {
        NumberInput::Int(value)
    }
}

/// An ISBN sent either as text or as a bare JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IsbnInput {
    Text(String),
    Number(u64),
}

impl From<&str> for IsbnInput {
    fn from(value: &str) -> Self {
        IsbnInput::Text(value.to_string())
    }
}

/// Deserialize a field into `Option<Option<T>>` so that an omitted key and an
/// explicit `null` can be told apart.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// - key omitted: `None`
/// - `null`: `Some(None)`
/// - value: `Some(Some(value))`
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validate a required text field, returning the trimmed value.
pub fn required_text(field: &str, value: Option<&str>) -> Result<String, CoreError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoreError::Validation(format!("{field} is required"))),
    }
}

/// Normalize an optional free-text field. Blank strings become `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Coerce an optional page count into a non-negative `i32`.
///
/// An empty string counts as "not provided".
pub fn coerce_count(field: &str, value: Option<&NumberInput>) -> Result<Option<i32>, CoreError> {
    let Some(raw) = coerce_integer(field, value)? else {
        return Ok(None);
    };
    if raw < 0 {
        return Err(CoreError::Validation(format!(
            "{field} must be a non-negative integer"
        )));
    }
    i32::try_from(raw)
        .map(Some)
        .map_err(|_| CoreError::Validation(format!("{field} is too large")))
}

/// Coerce an optional rating into the `0..=5` range.
pub fn coerce_rating(value: Option<&NumberInput>) -> Result<Option<i32>, CoreError> {
    let Some(raw) = coerce_integer("rating", value)? else {
        return Ok(None);
    };
    if !(0..=i64::from(MAX_RATING)).contains(&raw) {
        return Err(CoreError::Validation(format!(
            "rating must be between 0 and {MAX_RATING}"
        )));
    }
    Ok(Some(raw as i32))
}

/// Normalize an ISBN into its text form. Blank input becomes `None`.
pub fn normalize_isbn(value: Option<&IsbnInput>) -> Option<String> {
    match value? {
        IsbnInput::Text(text) => optional_text(Some(text)),
        IsbnInput::Number(n) => Some(n.to_string()),
    }
}

/// Collapse a list of ids into a sorted set without duplicates.
pub fn dedup_ids(ids: &[DbId]) -> Vec<DbId> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn coerce_integer(field: &str, value: Option<&NumberInput>) -> Result<Option<i64>, CoreError> {
    let invalid = || CoreError::Validation(format!("{field} must be an integer"));

    match value {
        None => Ok(None),
        Some(NumberInput::Int(n)) => Ok(Some(*n)),
        Some(NumberInput::Float(f)) => {
            if f.fract() != 0.0 || !f.is_finite() || f.abs() > i64::MAX as f64 {
                Err(invalid())
            } else {
                Ok(Some(*f as i64))
            }
        }
        Some(NumberInput::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                trimmed.parse::<i64>().map(Some).map_err(|_| invalid())
            }
        }
    }
}
