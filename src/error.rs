use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use std::fmt;

use crate::envelope::ResponseEnvelope;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Malformed request
    BadRequest(String),
    /// Authentication missing or invalid
    Unauthorized(String),
    /// Authenticated but not allowed
    Forbidden(String),
    /// Unknown route or resource
    NotFound(String),
    /// Request body over the configured limit
    PayloadTooLarge(String),
    /// Configuration error
    ConfigError(String),
    /// Internal server error
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ConfigError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::PayloadTooLarge(msg)
            | Self::ConfigError(msg)
            | Self::InternalError(msg) => msg,
        }
    }

    /// Error envelope for this error
    pub fn to_envelope(&self) -> ResponseEnvelope {
        let errors: Value = json!({ "type": error_type_name(self) });
        ResponseEnvelope::error(self.message(), Some(errors), self.status_code().as_u16())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_envelope().into_response()
    }
}

fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::BadRequest(_) => "bad_request",
        AppError::Unauthorized(_) => "not_authenticated",
        AppError::Forbidden(_) => "permission_denied",
        AppError::NotFound(_) => "not_found",
        AppError::PayloadTooLarge(_) => "payload_too_large",
        AppError::ConfigError(_) => "config_error",
        AppError::InternalError(_) => "internal_error",
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ResponsePayload;

    #[test]
    fn test_error_display() {
        let error = AppError::Forbidden("not the owner".to_string());
        assert_eq!(error.to_string(), "Forbidden: not the owner");
    }

    #[test]
    fn test_error_type_name() {
        assert_eq!(
            error_type_name(&AppError::Unauthorized("test".to_string())),
            "not_authenticated"
        );
        assert_eq!(
            error_type_name(&AppError::Forbidden("test".to_string())),
            "permission_denied"
        );
    }

    #[test]
    fn test_error_envelope_shape() {
        let envelope = AppError::NotFound("No such route".to_string()).to_envelope();
        let body = envelope.to_json();

        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "No such route");
        assert_eq!(body["errors"]["type"], "not_found");
        assert_eq!(body["status_code"], 404);
    }

    #[tokio::test]
    async fn test_error_response() {
        let error = AppError::Forbidden("Staff only".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.extensions().get::<ResponsePayload>().is_some());
    }
}
