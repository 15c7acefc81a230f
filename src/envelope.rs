//! Uniform success/error response body shared by every handler.
//!
//! ```
//! use lawyer_office_api::envelope::{EnvelopeStatus, ResponseEnvelope};
//! use serde_json::json;
//!
//! let envelope = ResponseEnvelope::success(json!({"id": 1}), "ok", 200);
//! assert_eq!(envelope.status(), EnvelopeStatus::Success);
//! assert_eq!(envelope.data(), Some(&json!({"id": 1})));
//! assert!(envelope.errors().is_none());
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Operation completed successfully";
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

impl EnvelopeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Payload {
    Data(Value),
    Errors(Value),
}

/// Structured body a handler produced, exposed to the logging middleware
/// through the response extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePayload(pub Value);

/// Immutable `{status, message, data|errors, status_code}` response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    status: EnvelopeStatus,
    message: String,
    #[serde(flatten)]
    payload: Payload,
    status_code: u16,
}

impl ResponseEnvelope {
    pub fn success(data: Value, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: message.into(),
            payload: Payload::Data(data),
            status_code,
        }
    }

    /// `errors` of `None` is rendered as an empty object
    pub fn error(message: impl Into<String>, errors: Option<Value>, status_code: u16) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: message.into(),
            payload: Payload::Errors(errors.unwrap_or_else(|| json!({}))),
            status_code,
        }
    }

    /// `success` with the default message and a 200 status
    pub fn ok(data: Value) -> Self {
        Self::success(data, DEFAULT_SUCCESS_MESSAGE, 200)
    }

    pub fn status(&self) -> EnvelopeStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn data(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Data(data) => Some(data),
            Payload::Errors(_) => None,
        }
    }

    pub fn errors(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Errors(errors) => Some(errors),
            Payload::Data(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        let (key, value) = match &self.payload {
            Payload::Data(data) => ("data", data.clone()),
            Payload::Errors(errors) => ("errors", errors.clone()),
        };

        let mut body = serde_json::Map::new();
        body.insert("status".to_string(), json!(self.status.as_str()));
        body.insert("message".to_string(), json!(self.message));
        body.insert(key.to_string(), value);
        body.insert("status_code".to_string(), json!(self.status_code));
        Value::Object(body)
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        json_response(status, self.to_json())
    }
}

/// Render `body` as JSON and attach it as a [`ResponsePayload`]
pub fn json_response(status: StatusCode, body: Value) -> Response {
    let mut response = (status, Json(body.clone())).into_response();
    response.extensions_mut().insert(ResponsePayload(body));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let envelope = ResponseEnvelope::success(json!({"id": 1}), "ok", 200);

        assert_eq!(envelope.status(), EnvelopeStatus::Success);
        assert_eq!(envelope.message(), "ok");
        assert_eq!(envelope.status_code(), 200);
        assert_eq!(envelope.data(), Some(&json!({"id": 1})));
        assert!(envelope.errors().is_none());

        let body = envelope.to_json();
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["id"], 1);
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_error_envelope_defaults_errors_to_empty_object() {
        let envelope = ResponseEnvelope::error(DEFAULT_ERROR_MESSAGE, None, 400);

        assert_eq!(envelope.status(), EnvelopeStatus::Error);
        assert_eq!(envelope.errors(), Some(&json!({})));
        assert!(envelope.data().is_none());

        let body = envelope.to_json();
        assert_eq!(body["message"], "An error occurred");
        assert_eq!(body["status_code"], 400);
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let envelope =
            ResponseEnvelope::error("Invalid input", Some(json!({"name": ["required"]})), 422);
        let serialized = serde_json::to_value(&envelope).unwrap();
        assert_eq!(serialized, envelope.to_json());
    }

    #[test]
    fn test_ok_uses_defaults() {
        let envelope = ResponseEnvelope::ok(json!([1, 2]));
        assert_eq!(envelope.message(), DEFAULT_SUCCESS_MESSAGE);
        assert_eq!(envelope.status_code(), 200);
    }

    #[tokio::test]
    async fn test_into_response_sets_status_and_payload() {
        let envelope = ResponseEnvelope::error("Forbidden", None, 403);
        let expected = envelope.to_json();
        let response = envelope.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let payload = response.extensions().get::<ResponsePayload>().unwrap();
        assert_eq!(payload.0, expected);
    }

    #[test]
    fn test_invalid_status_code_falls_back_to_500() {
        let response = ResponseEnvelope::error("bad", None, 42).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
