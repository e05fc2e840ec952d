use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::infrastructure::gemini::GenerationError;
use crate::infrastructure::identity::IdentityError;
use crate::infrastructure::page::PageError;
use crate::limiter::LimiterError;

#[derive(Debug)]
pub enum AppError {
    /// No usable client address on the request.
    MissingClientIdentity,
    RateLimited { wait_ms: u64 },
    LimiterUnavailable,
    Unauthorized,
    IdentityUnavailable,
    Validation(String),
    NotFound(&'static str),
    Database(sqlx::Error),
    InvalidPrompt,
    Generation(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: i32,
    error_message: String,
}

/// Whole seconds a denied client should wait, rounded up.
pub fn retry_after_secs(wait_ms: u64) -> u64 {
    wait_ms.div_ceil(1000)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MissingClientIdentity => (
                StatusCode::BAD_REQUEST,
                "Could not determine client identity".to_string(),
            ),
            AppError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
            AppError::LimiterUnavailable => (
                StatusCode::BAD_GATEWAY,
                "Rate limiter unavailable".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid access token".to_string(),
            ),
            AppError::IdentityUnavailable => (
                StatusCode::BAD_GATEWAY,
                "Identity provider unavailable".to_string(),
            ),
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::InvalidPrompt => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid prompt".to_string(),
            ),
            AppError::Generation(message) => (StatusCode::BAD_GATEWAY, message.clone()),
        };

        let body = Json(ErrorResponse {
            code: status.as_u16() as i32,
            error_message,
        });
        let mut response = (status, body).into_response();

        if let AppError::RateLimited { wait_ms } = self {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after_secs(wait_ms)),
            );
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<LimiterError> for AppError {
    fn from(e: LimiterError) -> Self {
        tracing::error!("Rate limiter error: {}", e);
        AppError::LimiterUnavailable
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Rejected => AppError::Unauthorized,
            IdentityError::Unavailable(reason) => {
                tracing::error!("Identity provider error: {}", reason);
                AppError::IdentityUnavailable
            }
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(e: GenerationError) -> Self {
        tracing::warn!("List generation failed: {}", e);
        AppError::Generation(e.to_string())
    }
}

impl From<PageError> for AppError {
    fn from(e: PageError) -> Self {
        tracing::warn!("Page fetch failed: {}", e);
        AppError::Generation(format!("Could not read page: {}", e))
    }
}
