//! Application Layer
//!
//! Use cases and application services.

pub mod admin;
pub mod bootstrap;
pub mod cache_diagnostics;
pub mod config;
pub mod login;
pub mod register;
pub mod verify_totp;

// Re-exports
pub use admin::{
    AdminCreateUserInput, AdminCreateUserOutput, AdminCreateUserUseCase, AdminListUsersUseCase,
};
pub use bootstrap::EnsureInitialAdminUseCase;
pub use cache_diagnostics::{
    CacheDiagnosticsInput, CacheDiagnosticsReport, CacheDiagnosticsUseCase,
};
pub use config::AuthConfig;
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use verify_totp::{VerifyTotpInput, VerifyTotpOutput, VerifyTotpUseCase};

use crate::domain::entity::account::Account;
use crate::domain::entity::audit_event::AuditEvent;
use crate::domain::repository::AuditLog;
use crate::domain::value_object::{
    account_password::{AccountPassword, RawPassword},
    display_name::DisplayName,
    email::Email,
    totp_secret::TotpSecret,
};
use crate::error::{AuthError, AuthResult};

/// Append an audit event, swallowing failures
///
/// Logging must never fail or roll back the authentication operation that
/// triggered it; a failed append is reported on the tracing channel only.
pub(crate) async fn record_audit<L: AuditLog>(audit: &L, event: AuditEvent) {
    let action = event.action;
    if let Err(e) = audit.append(event).await {
        tracing::warn!(action = %action, error = %e, "Failed to append audit event");
    }
}

/// Hash the password and provision the TOTP secret + enrollment artifact
/// for a brand-new account
///
/// Secrets are never reused between identities: every call generates a
/// fresh one. Any failure aborts before a record exists.
pub(crate) fn provision_account(
    email: Email,
    display_name: Option<DisplayName>,
    raw_password: &RawPassword,
    pepper: Option<&[u8]>,
    issuer: &str,
) -> AuthResult<Account> {
    let password_hash = AccountPassword::from_raw(raw_password, pepper)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let secret = TotpSecret::generate();
    let enrollment_qr = secret
        .enrollment_artifact(issuer, email.as_str())
        .map_err(|e| AuthError::Provisioning(e.to_string()))?;

    Ok(Account::new(
        email,
        display_name,
        password_hash,
        secret,
        enrollment_qr,
    ))
}
