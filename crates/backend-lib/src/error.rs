// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use notes_common::{ErrorDetail, ErrorResponse, FieldMessage};
use thiserror::Error;
use tracing::error;

use crate::storage::StorageError;
use crate::validation::{ValidationError, ValidationErrors};

/// Message returned for every failed sign-in, whatever the cause
pub const INVALID_CREDENTIALS: &str = "Incorrect email or password";

/// Message returned when an email is already registered
pub const EMAIL_EXISTS: &str = "Email already exists";

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Email already exists")]
    EmailExists,

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredentials | AppError::EmailExists => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "AUTH_001",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::EmailExists => "CONFLICT_001",
            AppError::Validation(_) => "VAL_001",
            AppError::Storage(_) => "STORE_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Unauthorized(_) => "Unauthorized".to_string(),
            AppError::InvalidCredentials => INVALID_CREDENTIALS.to_string(),
            AppError::EmailExists => EMAIL_EXISTS.to_string(),
            AppError::Validation(_) => "Validation failed".to_string(),
            AppError::Storage(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }

    fn field_messages(&self) -> Vec<FieldMessage> {
        match self {
            AppError::Validation(errors) => errors
                .iter()
                .map(|e| FieldMessage {
                    field: e.field().to_string(),
                    message: e.message().to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), "request failed: {self}");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                fields: self.field_messages(),
            },
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UniqueViolation("email") => AppError::EmailExists,
            other => AppError::Storage(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.into())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {err}"))
    }
}
