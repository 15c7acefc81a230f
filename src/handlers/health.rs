use axum::{http::StatusCode, response::Response};
use serde_json::json;

use crate::envelope::json_response;

pub const SERVICE_NAME: &str = "lawyer-office-management-api";

/// Liveness probe
pub async fn health_check() -> Response {
    json_response(
        StatusCode::OK,
        json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Readiness probe
///
/// The service holds no external connections, so it is ready as soon as it
/// accepts requests.
pub async fn readiness_check() -> Response {
    json_response(
        StatusCode::OK,
        json!({
            "status": "ready",
            "service": SERVICE_NAME,
        }),
    )
}
