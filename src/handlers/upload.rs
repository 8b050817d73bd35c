use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub ruta: String,
    pub url: String,
    pub nombre: Option<String>,
    #[serde(rename = "tamaño")]
    pub size: usize,
    pub tipo: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageQuery {
    #[serde(default)]
    pub ruta: String,
}

/// POST /api/upload/imagen - store one image sent as multipart field `file`
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        let stored = state
            .uploads
            .store_image(original_name.as_deref(), content_type.as_deref(), &bytes)
            .await?;

        let url = format!("{}{}", state.public_base_url.trim_end_matches('/'), stored.path);
        return Ok(Json(UploadResponse {
            success: true,
            message: "Image uploaded".to_string(),
            ruta: stored.path,
            url,
            nombre: original_name,
            size: stored.size,
            tipo: stored.content_type,
        }));
    }

    Err(ApiError::bad_request("No file was sent"))
}

/// DELETE /api/upload/imagen?ruta=/uploads/<file>
pub async fn delete_image(
    State(state): State<AppState>,
    Query(query): Query<DeleteImageQuery>,
) -> Result<Json<Value>, ApiError> {
    if state.uploads.delete_image(&query.ruta).await? {
        Ok(Json(json!({ "success": true, "message": "Image deleted" })))
    } else {
        Err(ApiError::bad_request("Could not delete the image"))
    }
}

/// GET /api/upload/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "File Upload Service",
        "status": "running",
        "uploadDirectory": state.uploads.upload_directory(),
        "message": "Image service is running",
    }))
}
