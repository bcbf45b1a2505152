//! Register Use Case
//!
//! Creates a new account: hashes the password, provisions the TOTP secret
//! and enrollment QR, and writes the record through store and cache.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::record_audit;
use crate::domain::entity::audit_event::{AuditAction, AuditEvent, AuditOutcome, AuditReason};
use crate::domain::repository::{AuditLog, CredentialStore};
use crate::domain::value_object::{
    account_password::RawPassword, display_name::DisplayName, email::Email,
};
use crate::error::{AuthError, AuthResult};
use crate::infra::cached_store::CachedCredentialStore;

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub client_ip: String,
}

/// Register output
pub struct RegisterOutput {
    pub identity: String,
    /// QR data URL to scan into an authenticator app
    pub enrollment_qr: String,
    /// Raw secret, populated only when the development debug flag is on
    pub secret_debug: Option<String>,
}

/// Register use case
pub struct RegisterUseCase<S, L>
where
    S: CredentialStore + Sync,
    L: AuditLog,
{
    store: Arc<CachedCredentialStore<S>>,
    audit: Arc<L>,
    config: Arc<AuthConfig>,
}

impl<S, L> RegisterUseCase<S, L>
where
    S: CredentialStore + Sync,
    L: AuditLog,
{
    pub fn new(
        store: Arc<CachedCredentialStore<S>>,
        audit: Arc<L>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            store,
            audit,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let identity = input.email.clone();
        let ip = input.client_ip.clone();

        let result = self.try_execute(input).await;

        let (outcome, reason, metadata) = match &result {
            Ok(_) => (
                AuditOutcome::Success,
                AuditReason::NewUserCreated,
                serde_json::json!({"ip": ip, "has_2fa": true}),
            ),
            Err(AuthError::MissingCredentials) | Err(AuthError::Validation(_)) => (
                AuditOutcome::Failure,
                AuditReason::MissingCredentials,
                serde_json::json!({"ip": ip}),
            ),
            Err(AuthError::AccountExists) => (
                AuditOutcome::Failure,
                AuditReason::UserAlreadyExists,
                serde_json::json!({"ip": ip}),
            ),
            Err(e) => (
                AuditOutcome::Error,
                AuditReason::InternalError,
                serde_json::json!({"ip": ip, "error": e.to_string()}),
            ),
        };
        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::Register, identity, outcome, reason, metadata),
        )
        .await;

        result
    }

    async fn try_execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        // Validation happens before any store access
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let email =
            Email::new(&input.email).map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let display_name = match input.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => Some(
                DisplayName::new(name)
                    .map_err(|e| AuthError::Validation(e.message().to_string()))?,
            ),
            _ => None,
        };

        let raw_password = RawPassword::new(input.password)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let issuer = self.config.totp_issuer.clone();
        let pepper = self.config.password_pepper.clone();
        let expose_secret = self.config.dev_expose_totp_debug;

        let output = self
            .store
            .mutate(move |accounts| {
                // Create must fail, never overwrite
                if accounts.contains(email.as_str()) {
                    return Err(AuthError::AccountExists);
                }

                // Hashing and provisioning happen only after the duplicate
                // check; any failure aborts before a partial record exists.
                let account = crate::application::provision_account(
                    email,
                    display_name,
                    &raw_password,
                    pepper.as_deref(),
                    &issuer,
                )?;

                let identity = account.identity().to_string();
                let enrollment_qr = account.enrollment_qr.clone();
                let secret_debug =
                    expose_secret.then(|| account.totp_secret.as_base32().to_string());
                accounts.insert(account);

                Ok(RegisterOutput {
                    identity,
                    enrollment_qr,
                    secret_debug,
                })
            })
            .await?;

        tracing::info!(identity = %output.identity, "User registered");

        Ok(output)
    }
}
