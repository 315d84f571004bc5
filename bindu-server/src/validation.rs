//! Request validation module
//!
//! Helpers for turning loosely-typed JSON bodies into validated input.

use axum::{extract::rejection::JsonRejection, Json};

use crate::error::ApiError;

/// Unwrap a JSON body, reporting malformed or non-JSON bodies as 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Require a non-blank string field.
///
/// Missing, empty and whitespace-only values are all rejected with `message`.
pub fn required_field(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ApiError::bad_request(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_field_accepts_value() {
        assert_eq!(
            required_field(Some(" 65f1c0ffee ".into()), "User ID is required").unwrap(),
            "65f1c0ffee"
        );
    }

    #[test]
    fn test_required_field_rejects_missing_and_blank() {
        for value in [None, Some(String::new()), Some("   ".to_string())] {
            let err = required_field(value, "User ID is required").unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(ref m) if m == "User ID is required"));
        }
    }
}
