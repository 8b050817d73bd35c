use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{parse_token, validate_token};
use crate::error::ApiError;

/// Require a structurally valid session token on the wrapped routes
pub async fn bearer_token_middleware(headers: HeaderMap, request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;

    if !validate_token(&token) {
        return Err(ApiError::unauthorized("Invalid session token"));
    }

    if let Some(session) = parse_token(&token) {
        tracing::debug!(username = %session.username, "Bearer token accepted");
    }

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Empty session token".to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}
