use crate::errors::DbError;

use super::types::{Filter, Request};

/// # Errors
/// Returns an error if the JSON string is not a valid request envelope.
pub fn parse_request_json(json: &str) -> Result<Request, DbError> {
    Ok(serde_json::from_str(json)?)
}

/// # Errors
/// Returns an error if the host value is not a valid request envelope.
pub fn request_from_value(value: serde_json::Value) -> Result<Request, DbError> {
    Ok(serde_json::from_value(value)?)
}

/// # Errors
/// Returns an error if the JSON string is not an array of condition arrays.
pub fn parse_filter_json(json: &str) -> Result<Filter, DbError> {
    Ok(serde_json::from_str(json)?)
}
