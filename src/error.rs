use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

/// Failures surfaced by the entity managers and the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    #[error("referential integrity violated: {0}")]
    ReferentialIntegrityFailure(String),

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("password hashing failed: {0}")]
    HashingFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailure(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationFailure(_) => StatusCode::BAD_REQUEST,
            Self::ReferentialIntegrityFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ConstraintViolation(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::HashingFailure(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Postgres SQLSTATE codes for integrity violations.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NOT_NULL_VIOLATION: &str = "23502";
const CHECK_VIOLATION: &str = "23514";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let detail = db_err.message().to_string();
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => return Self::ConstraintViolation(detail),
                Some(FOREIGN_KEY_VIOLATION) => return Self::ReferentialIntegrityFailure(detail),
                Some(NOT_NULL_VIOLATION) | Some(CHECK_VIOLATION) => {
                    return Self::ValidationFailure(detail)
                }
                _ => {}
            }
        }
        Self::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, message).into_response()
    }
}
