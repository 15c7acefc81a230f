use axum::http::Uri;

use crate::error::AppError;

/// Unknown routes answer with a 404 error envelope
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
