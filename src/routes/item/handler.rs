use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{AppState, error::AppError, infrastructure::AuthUser};

use super::model::{Item, ItemPayload};

#[axum::debug_handler]
pub async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Item>>, AppError> {
    Ok(Json(Item::list(&state.pool, user.id).await?))
}

#[axum::debug_handler]
pub async fn get_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Item>, AppError> {
    Item::find(&state.pool, user.id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Item"))
}

#[axum::debug_handler]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    let item = Item::create(&state.pool, user.id, req.validate()?).await?;
    tracing::info!(user_id = %user.id, item_id = item.id, "Item created");
    Ok((StatusCode::CREATED, Json(item)))
}

#[axum::debug_handler]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<ItemPayload>,
) -> Result<Json<Item>, AppError> {
    Item::update(&state.pool, user.id, id, req.validate()?)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Item"))
}

#[axum::debug_handler]
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !Item::delete(&state.pool, user.id, id).await? {
        return Err(AppError::NotFound("Item"));
    }
    Ok(Json(json!({ "message": "Item deleted" })))
}
