//! Unified error handling for LeaveFlow
//!
//! This module provides the error type shared by every crate, with automatic
//! HTTP response mapping. Internal failures are logged in full and reported
//! to the caller with a generic message.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message returned to callers for every 5xx error
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    // ==================== Authentication Errors ====================
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session expired")]
    TokenExpired,

    #[error("Invalid session: {0}")]
    InvalidToken(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Current password is incorrect")]
    IncorrectPassword,

    // ==================== Business Logic Errors ====================
    #[error("Insufficient leave balance. You have {remaining} days remaining, but requested {requested} days.")]
    InsufficientBalance { remaining: i32, requested: i32 },

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Leave request not found: {0}")]
    LeaveRequestNotFound(String),

    // ==================== Validation Errors ====================
    #[error("{0}")]
    Validation(String),

    // ==================== Resource Errors ====================
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ==================== External Service Errors ====================
    #[error("Notification failed: {0}")]
    Notification(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::IncorrectPassword
            | AppError::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::InvalidCredentials
            | AppError::InvalidToken(_)
            | AppError::TokenExpired
            | AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::UserNotFound(_) | AppError::LeaveRequestNotFound(_) => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Migration(_)
            | AppError::PasswordHash(_)
            | AppError::Internal(_)
            | AppError::Config(_)
            | AppError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Migration(_) => "migration_error",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::TokenExpired => "session_expired",
            AppError::InvalidToken(_) => "invalid_session",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::PasswordHash(_) => "password_error",
            AppError::IncorrectPassword => "incorrect_password",
            AppError::InsufficientBalance { .. } => "insufficient_balance",
            AppError::UserNotFound(_) => "user_not_found",
            AppError::LeaveRequestNotFound(_) => "leave_request_not_found",
            AppError::Validation(_) => "validation_error",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Notification(_) => "notification_error",
        }
    }

    /// Shorthand for the 401 raised when no session is present
    pub fn unauthenticated() -> Self {
        AppError::Unauthenticated("Authentication required".to_string())
    }

    /// Whether the caller sees a generic message instead of the detail
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut body = json!({
            "error": self.error_code(),
            "message": self.public_message(),
            "status": status.as_u16(),
        });

        if self.is_internal() {
            error!(code = self.error_code(), error = %self, "Request failed with internal error");

            // Development builds echo the detail back to ease debugging
            if cfg!(debug_assertions) {
                body["detail"] = json!(self.to_string());
            }
        }

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::unauthenticated().status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("nope".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::LeaveRequestNotFound("123".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InsufficientBalance {
                remaining: 5,
                requested: 10
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::IncorrectPassword.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_insufficient_balance_message() {
        let err = AppError::InsufficientBalance {
            remaining: 5,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. You have 5 days remaining, but requested 10 days."
        );
        assert_eq!(err.error_code(), "insufficient_balance");
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = AppError::Database("relation \"users\" does not exist".to_string());
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);

        let err = AppError::Validation("reason: must not be empty".to_string());
        assert_eq!(err.public_message(), "reason: must not be empty");
    }

    #[actix_web::test]
    async fn test_error_response_body() {
        let resp = AppError::Forbidden("Not authorized to update this request".to_string())
            .error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "forbidden");
        assert_eq!(json["message"], "Not authorized to update this request");
        assert_eq!(json["status"], 403);
    }
}
