use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::DatabaseError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    /// Raised by the endpoint layer for `GET /users/{id}`.
    #[error("User not found")]
    NotFound(i32),

    /// The only lookup where absence is an error.
    #[error("User not found: There is not a user with this email")]
    EmailNotFound,

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<DatabaseError> for UserError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Postgres(e) => UserError::Database(e),
            DatabaseError::InvalidFilter { .. } => UserError::InvalidFilter(err.to_string()),
            other => UserError::Internal(other.to_string()),
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) | UserError::EmailNotFound => AppError::NotFound(err.to_string()),
            UserError::DuplicateEmail(_) => AppError::Conflict(err.to_string()),
            UserError::InvalidFilter(msg) => AppError::BadRequest(msg),
            UserError::Database(e) => AppError::Database(e),
            UserError::PasswordHash(msg) | UserError::Internal(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
