//! Error taxonomy and the HTTP error envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::{ErrorDto, ErrorResponse};

/// Storage-level failure. Whatever the backend, these are faults of the persistence
/// collaborator and never a normal "not found" outcome.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Application error raised by the workflow and rendered by the handlers.
#[derive(Error, Debug)]
pub enum AppError {
    /// The authenticated principal has no matching account.
    #[error("Account with login={0} is not found")]
    AccountNotFound(String),

    #[error("Car with id={0} is not found")]
    CarNotFound(i32),

    /// The caller lacks every role the endpoint accepts.
    #[error("Access is denied")]
    AccessDenied,

    #[error("Account with login={0} already exists")]
    LoginTaken(String),

    #[error("Login must not be blank")]
    BlankLogin,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::AccountNotFound(_) | AppError::CarNotFound(_) => {
                StatusCode::EXPECTATION_FAILED
            }
            AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::LoginTaken(_) => StatusCode::CONFLICT,
            AppError::BlankLogin => StatusCode::BAD_REQUEST,
            AppError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the envelope category for this error.
    pub fn error_response(&self) -> ErrorResponse {
        match self {
            AppError::AccountNotFound(_) | AppError::CarNotFound(_) => {
                ErrorResponse::ProcessingError
            }
            AppError::AccessDenied => ErrorResponse::AccessDenied,
            AppError::LoginTaken(_) => ErrorResponse::Conflict,
            AppError::BlankLogin => ErrorResponse::BadRequest,
            AppError::Repository(_) => ErrorResponse::InternalError,
        }
    }

    pub fn to_dto(&self) -> ErrorDto {
        let message = match self {
            // Storage details stay in the logs.
            AppError::Repository(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        ErrorDto {
            error_response: self.error_response(),
            message,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Repository(e) = &self {
            tracing::error!(error = %e, "storage failure");
        }
        (self.status_code(), Json(self.to_dto())).into_response()
    }
}
