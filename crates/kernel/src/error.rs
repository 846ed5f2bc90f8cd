//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// 404 naming the missing entity, e.g. `not_found("page")`.
    pub fn not_found(entity: &str) -> Self {
        AppError::NotFound(format!("{entity} not found"))
    }

    /// 403 with the generic permission message.
    pub fn forbidden() -> Self {
        AppError::Forbidden("insufficient permissions".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Never leak internal details to clients.
        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "internal server error");
                json!({ "message": "internal server error" })
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                json!({ "message": "internal server error" })
            }
            AppError::Validation(errors) => json!({
                "message": "validation failed",
                "errors": errors,
            }),
            _ => json!({ "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
