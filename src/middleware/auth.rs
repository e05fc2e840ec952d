use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, error::AppError};

/// Resolves the bearer token to an [`AuthUser`](crate::infrastructure::AuthUser)
/// and stores it in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_owned())
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let user = state.identity.verify(&token).await?;
    tracing::debug!(user_id = %user.id, "Authenticated request");

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
