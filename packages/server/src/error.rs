use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use foodgram_common::DomainError;
use foodgram_common::image::ImageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `PERMISSION_DENIED`, `NOT_FOUND`, `CONFLICT`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Cooking time must be 1-500 minutes")]
    pub message: String,
    /// Offending request field, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "cooking_time")]
    pub field: Option<&'static str>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation {
        field: Option<&'static str>,
        message: String,
    },
    TokenMissing,
    TokenInvalid,
    PermissionDenied,
    NotFound(String),
    /// Duplicate relationship or unique value. Reported as 400.
    Conflict(String),
    Internal(String),
}

impl AppError {
    /// Validation failure not tied to a single field (malformed body, bad query).
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Validation {
            field: None,
            message: message.into(),
        }
    }

    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: Some(field),
            message: message.into(),
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message, field) = match self {
            AppError::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message, field)
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
                None,
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
                None,
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Insufficient permissions".into(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, "CONFLICT", msg, None),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    None,
                )
            }
        };
        (
            status,
            ErrorBody {
                code,
                message,
                field,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { field, message } => AppError::Validation {
                field: Some(field),
                message,
            },
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::PermissionDenied => AppError::PermissionDenied,
            DomainError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            DomainError::Backend(detail) => AppError::Internal(detail),
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        AppError::invalid_field("image", err.to_string())
    }
}
