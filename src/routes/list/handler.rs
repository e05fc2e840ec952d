use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{AppState, error::AppError, infrastructure::AuthUser};

use super::model::{ShoppingList, UpdateListRequest};

#[axum::debug_handler]
pub async fn list_lists(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ShoppingList>>, AppError> {
    Ok(Json(ShoppingList::list(&state.pool, user.id).await?))
}

#[axum::debug_handler]
pub async fn create_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let list = ShoppingList::create_default(&state.pool, user.id).await?;
    tracing::info!(user_id = %user.id, list_id = list.id, name = %list.name, "List created");
    Ok((StatusCode::CREATED, Json(list)))
}

#[axum::debug_handler]
pub async fn update_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateListRequest>,
) -> Result<Json<ShoppingList>, AppError> {
    ShoppingList::update(&state.pool, user.id, id, req.validate()?)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("List"))
}

#[axum::debug_handler]
pub async fn delete_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !ShoppingList::delete(&state.pool, user.id, id).await? {
        return Err(AppError::NotFound("List"));
    }
    Ok(Json(json!({ "message": "List deleted" })))
}
