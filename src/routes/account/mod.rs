use axum::{Extension, Json, extract::State};
use serde_json::{Value, json};

use crate::{AppState, error::AppError, infrastructure::AuthUser};

/// Removes the caller's account at the identity provider.
#[axum::debug_handler]
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    state.identity.delete_user(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User account deleted successfully",
    })))
}
