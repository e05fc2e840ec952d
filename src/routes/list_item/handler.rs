use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{AppState, error::AppError, infrastructure::AuthUser};

use super::model::{AddListItemRequest, ListItem, UpdateListItemRequest};

#[axum::debug_handler]
pub async fn get_list_items(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(list_id): Path<i64>,
) -> Result<Json<Vec<ListItem>>, AppError> {
    Ok(Json(ListItem::for_list(&state.pool, user.id, list_id).await?))
}

#[axum::debug_handler]
pub async fn add_list_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AddListItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entry = ListItem::add(&state.pool, user.id, req.validate()?)
        .await?
        .ok_or(AppError::NotFound("List"))?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[axum::debug_handler]
pub async fn update_list_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateListItemRequest>,
) -> Result<Json<ListItem>, AppError> {
    ListItem::update(&state.pool, user.id, id, req.validate()?)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("List item"))
}

#[axum::debug_handler]
pub async fn delete_list_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !ListItem::delete(&state.pool, user.id, id).await? {
        return Err(AppError::NotFound("List item"));
    }
    Ok(Json(json!({ "message": "List item deleted" })))
}
