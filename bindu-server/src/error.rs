//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.
//! Every error body has the shape `{ message, success: false, error?, code }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bindu_core::{CaptureError, LaunchError, ProvisionError};
use serde::Serialize;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("{0}")]
    BadRequest(String),

    /// Not found - requested resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Request timeout - the awaited event never happened
    #[error("{0}")]
    Timeout(String),

    /// Internal server error, with the underlying cause when there is one
    #[error("{message}")]
    Internal {
        message: String,
        cause: Option<String>,
    },
}

/// Wire format of an error response
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    code: &'static str,
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Create an internal server error carrying the underlying error text
    pub fn internal_with(message: impl Into<String>, cause: impl ToString) -> Self {
        Self::Internal {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    fn cause(&self) -> Option<&str> {
        match self {
            Self::Internal { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }
}

impl From<CaptureError> for ApiError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::UserNotFound(_) => Self::not_found("User not found"),
            CaptureError::TimedOut(_) => Self::timeout("Timeout waiting for fingerprint image"),
            CaptureError::Watch(cause) => {
                Self::internal_with("Error watching for fingerprint file", cause)
            }
            CaptureError::Destination(e) => {
                Self::internal_with("Error preparing fingerprint directory", e)
            }
            CaptureError::Copy(e) => Self::internal_with("Error saving fingerprint image", e),
            CaptureError::Store(e) => Self::internal_with("Error updating user record", e),
        }
    }
}

impl From<LaunchError> for ApiError {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::NotFound(_) => Self::not_found("SDK executable not found"),
            LaunchError::Inaccessible { source, .. } => {
                Self::internal_with("Error launching fingerprint scanner SDK", source)
            }
            LaunchError::Spawn(e) => {
                Self::internal_with("Error launching fingerprint scanner SDK", e)
            }
        }
    }
}

impl From<ProvisionError> for ApiError {
    fn from(err: ProvisionError) -> Self {
        match err {
            ProvisionError::InvalidPath(reason) => {
                Self::bad_request(format!("Invalid folder path: {}", reason))
            }
            ProvisionError::Io(e) => Self::internal_with("Error creating temporary folder", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();
        let cause = self.cause();

        // Log based on severity, always including internal details
        match &self {
            Self::BadRequest(_) | Self::NotFound(_) => {
                tracing::warn!(
                    status = %status,
                    code = code,
                    error = %message,
                    "Client error"
                );
            }
            Self::Timeout(_) | Self::Internal { .. } => {
                tracing::error!(
                    status = %status,
                    code = code,
                    error = %message,
                    cause = cause.unwrap_or(""),
                    "Server error"
                );
            }
        }

        let body = ErrorBody {
            message: &message,
            success: false,
            error: cause,
            code,
        };

        (status, Json(body)).into_response()
    }
}
