pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every error response.
///
/// ```json
/// { "code": 1004, "error": "NOT_FOUND", "message": "User not found" }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Numeric code for logging and monitoring
    pub code: i32,
    /// Machine-readable identifier
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Structured details, e.g. per-field validation errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }
}

/// Error type every handler returns.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        self.classify().0
    }

    fn classify(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Database(e) => classify_db_error(e),
            AppError::JsonExtractorRejection(e) => (e.status(), ErrorCode::JsonExtraction),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError),
            AppError::InvalidId(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidId),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadRequest),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
            AppError::InternalServerError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError)
            }
            AppError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::ServiceUnavailable)
            }
        }
    }

    /// Message sent to the client. Server-side failures get the generic
    /// text of their code so driver details stay in the logs.
    fn client_message(&self, code: ErrorCode) -> String {
        match self {
            AppError::Database(_) | AppError::InternalServerError(_) => {
                code.default_message().to_string()
            }
            AppError::JsonExtractorRejection(e) => e.body_text(),
            AppError::ValidationError(_) => code.default_message().to_string(),
            AppError::InvalidId(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ServiceUnavailable(msg) => msg.clone(),
        }
    }
}

fn classify_db_error(e: &DbErr) -> (StatusCode, ErrorCode) {
    match e {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => {
            (StatusCode::NOT_FOUND, ErrorCode::DatabaseNotFound)
        }
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::DatabaseUnavailable)
        }
        _ => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                (StatusCode::CONFLICT, ErrorCode::Conflict)
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError),
        },
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();

        if status.is_server_error() {
            tracing::error!(error_code = code.code(), error = %self, "Request failed");
        } else if status == StatusCode::NOT_FOUND {
            tracing::debug!(error_code = code.code(), error = %self, "Request failed");
        } else {
            tracing::info!(error_code = code.code(), error = %self, "Request rejected");
        }

        let mut body = ErrorResponse::new(code, self.client_message(code));
        if let AppError::ValidationError(errors) = &self {
            body.details = serde_json::to_value(errors).ok();
        }

        (status, Json(body)).into_response()
    }
}

/// Builds an error response without going through [`AppError`].
pub fn error_response(status: StatusCode, message: impl Into<String>, code: ErrorCode) -> Response {
    (status, Json(ErrorResponse::new(code, message))).into_response()
}
