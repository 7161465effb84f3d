//! Error type system for the Textpert backend
//!
//! This module provides the error taxonomy shared by every handler:
//! - One enum for all request-level failures
//! - A single HTTP status code mapping
//! - JSON error bodies with trace IDs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Why a request failed bearer authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization: Bearer <token>` header
    MissingToken,
    /// Token could not be parsed or its signature does not verify
    InvalidToken,
    /// Token verified but its expiry has passed
    TokenExpired,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            AuthFailure::MissingToken => "No token provided",
            AuthFailure::InvalidToken => "Invalid token",
            AuthFailure::TokenExpired => "Token expired",
        };
        f.write_str(reason)
    }
}

/// Main error type for the Textpert backend
#[derive(Debug, thiserror::Error)]
pub enum TextpertError {
    // Client errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(AuthFailure),

    #[error("{0}")]
    NotFound(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    // Server errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task error: {0}")]
    TaskError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TextpertError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            TextpertError::InvalidCredentials
            | TextpertError::InvalidRequest(_)
            | TextpertError::ValidationError(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            TextpertError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            // 404 Not Found
            TextpertError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            TextpertError::EmailTaken(_) => StatusCode::CONFLICT,

            // 500 Internal Server Error
            TextpertError::ConfigError(_)
            | TextpertError::DatabaseError(_)
            | TextpertError::IoError(_)
            | TextpertError::TaskError(_)
            | TextpertError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            TextpertError::InvalidCredentials => "InvalidCredentials",
            TextpertError::InvalidRequest(_) => "InvalidRequest",
            TextpertError::ValidationError(_) => "ValidationError",
            TextpertError::Unauthorized(_) => "Unauthorized",
            TextpertError::NotFound(_) => "NotFound",
            TextpertError::EmailTaken(_) => "EmailTaken",
            TextpertError::ConfigError(_) => "ConfigError",
            TextpertError::DatabaseError(_) => "DatabaseError",
            TextpertError::IoError(_) => "IoError",
            TextpertError::TaskError(_) => "TaskError",
            TextpertError::Internal(_) => "Internal",
        }
    }

    /// Client errors are expected outcomes and are logged below error level
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<axum::extract::rejection::JsonRejection> for TextpertError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        TextpertError::InvalidRequest(rejection.body_text())
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response with a generated trace ID
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            trace_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an error response from a TextpertError
    pub fn from_error(error: &TextpertError) -> Self {
        Self::new(error.error_type().to_string(), error.to_string())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (trace_id: {})", self.error, self.message, self.trace_id)
    }
}

/// Implement IntoResponse for TextpertError to enable automatic error handling in Axum
impl IntoResponse for TextpertError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if self.is_client_error() {
            tracing::warn!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        } else {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with TextpertError
pub type Result<T> = std::result::Result<T, TextpertError>;
