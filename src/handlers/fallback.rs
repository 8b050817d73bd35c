use axum::{http::Uri, response::IntoResponse, Json};

use crate::error::ApiError;

const SUGGESTIONS: &[&str] = &[
    "/api/auth/login",
    "/api/auth/health",
    "/api/productos",
    "/api/productos/buscar",
    "/api/productos/categorias",
    "/api/upload/imagen",
    "/api/upload/status",
];

/// Fallback for unmatched /api paths: JSON 404 listing the known endpoints
pub async fn api_not_found(uri: Uri) -> impl IntoResponse {
    tracing::debug!(path = %uri.path(), "No API route matched");

    let error = ApiError::not_found(format!("Endpoint {} does not exist", uri.path()));
    let mut body = error.to_json();
    body["suggestions"] = serde_json::json!(SUGGESTIONS);

    (error.status_code(), Json(body))
}
