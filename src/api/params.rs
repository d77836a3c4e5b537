//! Request parameter parsing shared by every resource handler.
//!
//! Query parameters arrive as raw strings and body fields as loose JSON, so
//! that a malformed value can be reported with a field-specific code instead
//! of a generic extractor rejection.

use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::middleware::logging::ApiError;

pub const MAX_LIMIT: u64 = 100;

/// Query string of the single-record routes (PATCH, DELETE).
#[derive(Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

impl Pagination {
    /// `limit` falls back to `default_limit` and never exceeds [`MAX_LIMIT`].
    pub fn parse(
        limit: Option<&str>,
        offset: Option<&str>,
        default_limit: u64,
    ) -> Result<Self, ApiError> {
        let limit = match non_empty(limit) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                ApiError::invalid("limit must be a non-negative integer", "INVALID_LIMIT")
            })?,
            None => default_limit,
        };
        let offset = match non_empty(offset) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                ApiError::invalid("offset must be a non-negative integer", "INVALID_OFFSET")
            })?,
            None => 0,
        };

        Ok(Pagination {
            limit: limit.min(MAX_LIMIT),
            offset,
        })
    }
}

/// An absent or empty `id` means "no id"; anything else must be an integer.
pub fn optional_id(raw: Option<&str>) -> Result<Option<i32>, ApiError> {
    match non_empty(raw) {
        Some(raw) => raw.parse::<i32>().map(Some).map_err(|_| invalid_id()),
        None => Ok(None),
    }
}

pub fn required_id(raw: Option<&str>) -> Result<i32, ApiError> {
    optional_id(raw)?.ok_or_else(invalid_id)
}

fn invalid_id() -> ApiError {
    ApiError::invalid("Valid ID is required", "INVALID_ID")
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|raw| !raw.is_empty())
}

pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(payload)| payload)
        .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))
}

/// Missing in the loose sense used for id-like fields: absent, null, false,
/// zero or a blank string.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(flag)) => !flag,
        Some(Value::Number(number)) => number.as_f64() == Some(0.0),
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

/// Trimmed text, or `None` when absent or blank.
pub fn text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Accepts JSON integers, floats (truncated toward zero) and
/// numeric strings.
pub fn as_int(value: &Value) -> Option<i32> {
    let wide = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite())
                .map(|float| float.trunc() as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    i32::try_from(wide).ok()
}

pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|float| float.is_finite())
}

/// Strings are trimmed; numbers are rendered as their decimal text.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => text(Some(raw.as_str())),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub fn positive_float(value: &Value) -> Option<f64> {
    as_float(value).filter(|float| *float > 0.0)
}

pub fn positive_int(value: &Value) -> Option<i32> {
    as_int(value).filter(|int| *int > 0)
}

/// For PATCH bodies: tells an explicit `null` (`Some(None)`) apart from an
/// absent field (`None`). Use with `#[serde(default, deserialize_with)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
