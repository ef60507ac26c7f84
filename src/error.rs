use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short summary placed in the envelope's `message`; the detail goes in `errors`.
    fn summary(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "Invalid input",
            AppError::Unauthenticated(_) => "Authentication required",
            AppError::Forbidden(_) => "Access denied",
            AppError::NotFound(_) => "Resource not found",
            AppError::Conflict(_) => "Request conflicts with current state",
            AppError::InvalidTransition(_) => "Invalid status transition",
            AppError::Internal(_) => "Internal server error",
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                AppError::Conflict(format!("Duplicate value: {}", detail))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                AppError::Conflict(format!("Referenced record is missing: {}", detail))
            }
            _ => AppError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Internal error while handling request");
        }

        // Store details stay out of the response body.
        let detail = match &self {
            AppError::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        };

        let body = ApiResponse::<()>::failure(self.summary(), detail);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        let cases = [
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::InvalidTransition("x".into()), StatusCode::CONFLICT),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(status, err.status_code(), "{:?}", err);
        }
    }

    #[test]
    fn test_plain_db_error_is_internal() {
        let err = AppError::from(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, AppError::Internal(_)));
    }
}
