use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{AppState, error::AppError, infrastructure::AuthUser};

use super::model::{Category, CreateCategoryRequest};

#[axum::debug_handler]
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(Category::list(&state.pool, user.id).await?))
}

#[axum::debug_handler]
pub async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Name is required".into()))?;

    let category = Category::create(&state.pool, user.id, name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[axum::debug_handler]
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !Category::delete(&state.pool, user.id, id).await? {
        return Err(AppError::NotFound("Category"));
    }
    Ok(Json(json!({ "message": "Category deleted" })))
}
