use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{ProductDto, ProductSearch};

/// GET /api/productos - every product ordered by name
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductDto>>, ApiError> {
    Ok(Json(state.products.list().await?))
}

/// GET /api/productos/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<ProductDto>, ApiError> {
    Ok(Json(state.products.get(id).await?))
}

/// POST /api/productos
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ProductDto>, JsonRejection>,
) -> Result<Json<ProductDto>, ApiError> {
    let Json(dto) = payload?;
    Ok(Json(state.products.create(dto).await?))
}

/// PUT /api/productos/:id - replace every field of an existing product
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ProductDto>, JsonRejection>,
) -> Result<Json<ProductDto>, ApiError> {
    let Json(dto) = payload?;
    Ok(Json(state.products.update(id, dto).await?))
}

/// DELETE /api/productos/:id - 200 with an empty body
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<(), ApiError> {
    state.products.delete(id).await?;
    Ok(())
}

/// GET /api/productos/buscar?nombre=&categoria=&ofertaEspecial=
pub async fn search(
    State(state): State<AppState>,
    Query(search): Query<ProductSearch>,
) -> Result<Json<Vec<ProductDto>>, ApiError> {
    Ok(Json(state.products.search(search).await?))
}

/// GET /api/productos/categorias
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.products.categories().await?))
}
