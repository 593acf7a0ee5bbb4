//! Error types for rollcall.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// The redemption outcomes (`InvalidCode`, `CodeExpired`, `AlreadyMarked`)
/// and issuance outcomes (`DurationOutOfRange`, `ExhaustedKeyspace`) are
/// expected results of ordinary use and must stay discriminable so the HTTP
/// layer can render distinct messages for each.
#[derive(Debug, Error)]
pub enum AppError {
    // === Expected attendance outcomes ===
    #[error("Unknown attendance code")]
    InvalidCode,

    #[error("Attendance code has expired")]
    CodeExpired,

    #[error("Attendance already recorded for this session")]
    AlreadyMarked,

    #[error("Poll duration out of range: {0}")]
    DurationOutOfRange(String),

    #[error("Active codes exhaust the configured keyspace")]
    ExhaustedKeyspace,

    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCode | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::CodeExpired => StatusCode::GONE,
            Self::AlreadyMarked => StatusCode::CONFLICT,
            Self::DurationOutOfRange(_) | Self::BadRequest(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ExhaustedKeyspace => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCode => "INVALID_CODE",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::AlreadyMarked => "ALREADY_MARKED",
            Self::DurationOutOfRange(_) => "DURATION_OUT_OF_RANGE",
            Self::ExhaustedKeyspace => "EXHAUSTED_KEYSPACE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_outcomes_are_distinct() {
        let outcomes = [
            AppError::InvalidCode,
            AppError::CodeExpired,
            AppError::AlreadyMarked,
            AppError::DurationOutOfRange("0".to_string()),
            AppError::ExhaustedKeyspace,
        ];

        let codes: std::collections::HashSet<_> =
            outcomes.iter().map(|e| e.error_code()).collect();
        assert_eq!(codes.len(), outcomes.len());

        let statuses: std::collections::HashSet<_> =
            outcomes.iter().map(|e| e.status_code()).collect();
        // ALREADY_MARKED, CODE_EXPIRED, INVALID_CODE map to distinct statuses
        assert!(statuses.contains(&StatusCode::CONFLICT));
        assert!(statuses.contains(&StatusCode::GONE));
        assert!(statuses.contains(&StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_storage_failures_are_server_errors() {
        assert!(AppError::Database("connection reset".to_string()).is_server_error());
        assert!(!AppError::AlreadyMarked.is_server_error());
        assert!(!AppError::InvalidCode.is_server_error());
    }
}
