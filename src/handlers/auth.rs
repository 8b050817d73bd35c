use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::Administrator;
use crate::error::ApiError;
use crate::services::LoginOutcome;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub password: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Public profile of the administrator returned after login
#[derive(Debug, Serialize)]
pub struct AdminInfo {
    pub id: i64,
    pub username: String,
    pub nombre: Option<String>,
    pub email: Option<String>,
}

impl From<Administrator> for AdminInfo {
    fn from(admin: Administrator) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            nombre: admin.name,
            email: admin.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub admin: AdminInfo,
}

/// POST /api/auth/login - exchange credentials for a session token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    let outcome = state.auth.authenticate(&request.username, &request.password).await?;
    let message = outcome.message();

    match outcome {
        LoginOutcome::Success { token, admin } => Ok(Json(LoginResponse {
            success: true,
            message: message.to_string(),
            token,
            admin: admin.into(),
        })),
        LoginOutcome::Locked => Err(ApiError::locked(message)),
        LoginOutcome::InvalidCredentials => Err(ApiError::unauthorized(message)),
    }
}

/// GET /api/auth/health - liveness of the authentication endpoints
pub async fn auth_health(headers: HeaderMap) -> Json<Value> {
    let origin = headers
        .get(axum::http::header::ORIGIN)
        .and_then(|v| v.to_str().ok());

    Json(json!({
        "status": "OK",
        "service": "admin-panel-auth",
        "timestamp": chrono::Utc::now(),
        "cors": "enabled",
        "current_origin": origin,
    }))
}
