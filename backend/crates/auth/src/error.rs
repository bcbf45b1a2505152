//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Required request fields are missing or malformed
    #[error("Email and password required")]
    MissingCredentials,

    /// Input failed a format or policy rule (email shape, password policy)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Registration attempted for an identity that already exists
    #[error("User already exists")]
    AccountExists,

    /// Wrong password or unknown identity at login.
    /// One message for both cases so responses cannot be used to
    /// enumerate accounts.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Unknown identity at the OTP verification step
    #[error("Invalid user")]
    UserNotFound,

    /// TOTP code did not match any step in the verification window
    #[error("Invalid or expired TOTP. Please make sure your device time is synchronized.")]
    InvalidTotp,

    /// Caller is not an active admin account
    #[error("Admin access required")]
    AdminRequired,

    /// Credential store contents could not be parsed or validated.
    /// Never auto-healed; the stored data may still be recoverable.
    #[error("Credential store is corrupted: {0}")]
    StoreCorrupted(String),

    /// Credential store I/O failure
    #[error("Credential store error: {0}")]
    Store(#[from] std::io::Error),

    /// TOTP secret or enrollment artifact generation failed
    #[error("Secret provisioning failed: {0}")]
    Provisioning(String),

    /// OTP relay upstream is not configured
    #[error("OTP relay is not configured")]
    RelayNotConfigured,

    /// OTP relay upstream request failed
    #[error("OTP relay request failed: {0}")]
    Relay(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials
            | AuthError::Validation(_)
            | AuthError::AccountExists => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::UserNotFound | AuthError::InvalidTotp => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::AdminRequired => StatusCode::FORBIDDEN,
            AuthError::RelayNotConfigured | AuthError::Relay(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::StoreCorrupted(_)
            | AuthError::Store(_)
            | AuthError::Provisioning(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingCredentials
            | AuthError::Validation(_)
            | AuthError::AccountExists => ErrorKind::BadRequest,
            AuthError::InvalidCredentials | AuthError::UserNotFound | AuthError::InvalidTotp => {
                ErrorKind::Unauthorized
            }
            AuthError::AdminRequired => ErrorKind::Forbidden,
            AuthError::RelayNotConfigured | AuthError::Relay(_) => ErrorKind::ServiceUnavailable,
            AuthError::StoreCorrupted(_)
            | AuthError::Store(_)
            | AuthError::Provisioning(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::StoreCorrupted(detail) => {
                tracing::error!(detail = %detail, "Credential store corruption detected");
            }
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Credential store I/O error");
            }
            AuthError::Provisioning(msg) => {
                tracing::error!(message = %msg, "TOTP provisioning error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::Relay(msg) => {
                tracing::warn!(message = %msg, "OTP relay failure");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Internal(format!("JSON serialization error: {}", err))
    }
}
