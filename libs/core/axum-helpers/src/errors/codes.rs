//! Error codes carried in every [`super::ErrorResponse`].
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! assert_eq!(ErrorCode::NotFound.as_str(), "NOT_FOUND");
//! assert_eq!(ErrorCode::NotFound.code(), 1004);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Client-facing identifier plus a numeric code for dashboards.
///
/// 1xxx are request problems, 2xxx come from the database, 5xxx are
/// server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidId,
    JsonExtraction,
    NotFound,
    Unauthorized,
    Conflict,
    BadRequest,
    MethodNotAllowed,

    DatabaseNotFound,
    DatabaseUnavailable,
    DatabaseError,

    InternalError,
    ServiceUnavailable,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidId => "INVALID_ID",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Conflict => "CONFLICT",
            Self::BadRequest => "BAD_REQUEST",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseUnavailable => "DATABASE_UNAVAILABLE",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    pub const fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidId => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::Unauthorized => 1005,
            Self::Conflict => 1006,
            Self::BadRequest => 1007,
            Self::MethodNotAllowed => 1008,
            Self::DatabaseNotFound => 2001,
            Self::DatabaseUnavailable => 2002,
            Self::DatabaseError => 2003,
            Self::InternalError => 5001,
            Self::ServiceUnavailable => 5003,
        }
    }

    pub const fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidId => "Invalid id format",
            Self::JsonExtraction => "Invalid JSON body",
            Self::NotFound => "Resource not found",
            Self::Unauthorized => "Authentication required",
            Self::Conflict => "Resource already exists",
            Self::BadRequest => "Bad request",
            Self::MethodNotAllowed => "The HTTP method is not allowed for this resource",
            Self::DatabaseNotFound => "Record not found",
            Self::DatabaseUnavailable => "Database is unavailable",
            Self::DatabaseError => "A database error occurred",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
