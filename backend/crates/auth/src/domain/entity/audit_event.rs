//! Audit Event Entity
//!
//! Immutable record of one authentication state transition. Events are
//! append-only; nothing in the hot path reads them back.

use chrono::{DateTime, Utc};
use kernel::id::AuditEventId;
use std::fmt;

/// Audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Register,
    Login,
    VerifyTotp,
}

impl AuditAction {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            AuditAction::Register => "register",
            AuditAction::Login => "login",
            AuditAction::VerifyTotp => "verify-totp",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "register" => Some(AuditAction::Register),
            "login" => Some(AuditAction::Login),
            "verify-totp" => Some(AuditAction::VerifyTotp),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of the audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Operation completed
    Success,
    /// Rejected by validation or authentication rules
    Failure,
    /// Aborted by an internal fault (store, provisioning, ...)
    Error,
}

impl AuditOutcome {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
            AuditOutcome::Error => "error",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "success" => Some(AuditOutcome::Success),
            "failure" => Some(AuditOutcome::Failure),
            "error" => Some(AuditOutcome::Error),
            _ => None,
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Closed enumeration of audit reason codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditReason {
    NewUserCreated,
    UserAlreadyExists,
    MissingCredentials,
    UserNotFound,
    InvalidPassword,
    PasswordValid,
    OtpVerified,
    InvalidOrExpiredTotp,
    UserCreatedByAdmin,
    InternalError,
}

impl AuditReason {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            AuditReason::NewUserCreated => "new_user_created",
            AuditReason::UserAlreadyExists => "user_already_exists",
            AuditReason::MissingCredentials => "missing_credentials",
            AuditReason::UserNotFound => "user_not_found",
            AuditReason::InvalidPassword => "invalid_password",
            AuditReason::PasswordValid => "password_valid",
            AuditReason::OtpVerified => "otp_verified",
            AuditReason::InvalidOrExpiredTotp => "invalid_or_expired_totp",
            AuditReason::UserCreatedByAdmin => "user_created_by_admin",
            AuditReason::InternalError => "internal_error",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "new_user_created" => Some(AuditReason::NewUserCreated),
            "user_already_exists" => Some(AuditReason::UserAlreadyExists),
            "missing_credentials" => Some(AuditReason::MissingCredentials),
            "user_not_found" => Some(AuditReason::UserNotFound),
            "invalid_password" => Some(AuditReason::InvalidPassword),
            "password_valid" => Some(AuditReason::PasswordValid),
            "otp_verified" => Some(AuditReason::OtpVerified),
            "invalid_or_expired_totp" => Some(AuditReason::InvalidOrExpiredTotp),
            "user_created_by_admin" => Some(AuditReason::UserCreatedByAdmin),
            "internal_error" => Some(AuditReason::InternalError),
            _ => None,
        }
    }
}

impl fmt::Display for AuditReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One append-only audit record
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub identity: String,
    pub outcome: AuditOutcome,
    pub reason: AuditReason,
    /// Free-form context: client IP, error detail, flags
    pub metadata: serde_json::Value,
}

impl AuditEvent {
    /// Create an event stamped with the current time
    pub fn new(
        action: AuditAction,
        identity: impl Into<String>,
        outcome: AuditOutcome,
        reason: AuditReason,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            timestamp: Utc::now(),
            action,
            identity: identity.into(),
            outcome,
            reason,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_codes_roundtrip() {
        for action in [
            AuditAction::Register,
            AuditAction::Login,
            AuditAction::VerifyTotp,
        ] {
            assert_eq!(AuditAction::from_code(action.code()), Some(action));
        }
        assert_eq!(AuditAction::from_code("password-reset"), None);
    }

    #[test]
    fn test_outcome_codes_roundtrip() {
        for outcome in [
            AuditOutcome::Success,
            AuditOutcome::Failure,
            AuditOutcome::Error,
        ] {
            assert_eq!(AuditOutcome::from_code(outcome.code()), Some(outcome));
        }
    }

    #[test]
    fn test_reason_codes_roundtrip() {
        for reason in [
            AuditReason::NewUserCreated,
            AuditReason::UserAlreadyExists,
            AuditReason::MissingCredentials,
            AuditReason::UserNotFound,
            AuditReason::InvalidPassword,
            AuditReason::PasswordValid,
            AuditReason::OtpVerified,
            AuditReason::InvalidOrExpiredTotp,
            AuditReason::UserCreatedByAdmin,
            AuditReason::InternalError,
        ] {
            assert_eq!(AuditReason::from_code(reason.code()), Some(reason));
        }
    }

    #[test]
    fn test_event_construction() {
        let event = AuditEvent::new(
            AuditAction::Login,
            "a@x.com",
            AuditOutcome::Failure,
            AuditReason::InvalidPassword,
            serde_json::json!({"ip": "127.0.0.1"}),
        );
        assert_eq!(event.identity, "a@x.com");
        assert_eq!(event.action.code(), "login");
        assert_eq!(event.reason.code(), "invalid_password");
    }
}
