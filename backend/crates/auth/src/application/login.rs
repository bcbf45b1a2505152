//! Login Use Case
//!
//! First authentication factor: password verification against the cached
//! credential snapshot. Login never mutates the store; completing the
//! flow is the OTP verification step's job.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::record_audit;
use crate::domain::entity::audit_event::{AuditAction, AuditEvent, AuditOutcome, AuditReason};
use crate::domain::repository::{AuditLog, CredentialStore};
use crate::domain::value_object::account_password::RawPassword;
use crate::error::{AuthError, AuthResult};
use crate::infra::cached_store::CachedCredentialStore;

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub client_ip: String,
}

/// Login output
#[derive(Debug)]
pub struct LoginOutput {
    /// False only when the account already completed OTP verification
    pub requires_otp: bool,
}

/// Internal failure classification
///
/// Unknown identity and wrong password are audited distinctly but must
/// collapse into one generic client-facing error, so responses cannot be
/// used to enumerate accounts.
enum LoginFailure {
    Missing,
    NotFound,
    WrongPassword,
    Fault(AuthError),
}

impl LoginFailure {
    fn into_error(self) -> AuthError {
        match self {
            LoginFailure::Missing => AuthError::MissingCredentials,
            LoginFailure::NotFound | LoginFailure::WrongPassword => AuthError::InvalidCredentials,
            LoginFailure::Fault(e) => e,
        }
    }
}

/// Login use case
pub struct LoginUseCase<S, L>
where
    S: CredentialStore + Sync,
    L: AuditLog,
{
    store: Arc<CachedCredentialStore<S>>,
    audit: Arc<L>,
    config: Arc<AuthConfig>,
}

impl<S, L> LoginUseCase<S, L>
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

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let identity = input.email.clone();
        let ip = input.client_ip.clone();

        let result = self.try_execute(input).await;

        let (outcome, reason, metadata) = match &result {
            Ok(output) => (
                AuditOutcome::Success,
                AuditReason::PasswordValid,
                serde_json::json!({"ip": ip, "requires_otp": output.requires_otp}),
            ),
            Err(LoginFailure::Missing) => (
                AuditOutcome::Failure,
                AuditReason::MissingCredentials,
                serde_json::json!({"ip": ip}),
            ),
            Err(LoginFailure::NotFound) => (
                AuditOutcome::Failure,
                AuditReason::UserNotFound,
                serde_json::json!({"ip": ip}),
            ),
            Err(LoginFailure::WrongPassword) => (
                AuditOutcome::Failure,
                AuditReason::InvalidPassword,
                serde_json::json!({"ip": ip}),
            ),
            Err(LoginFailure::Fault(e)) => (
                AuditOutcome::Error,
                AuditReason::InternalError,
                serde_json::json!({"ip": ip, "error": e.to_string()}),
            ),
        };
        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::Login, identity, outcome, reason, metadata),
        )
        .await;

        result.map_err(LoginFailure::into_error)
    }

    async fn try_execute(&self, input: LoginInput) -> Result<LoginOutput, LoginFailure> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(LoginFailure::Missing);
        }

        let accounts = self.store.read().await.map_err(LoginFailure::Fault)?;

        let Some(account) = accounts.get(&input.email) else {
            return Err(LoginFailure::NotFound);
        };

        // A password that fails policy can never match a stored hash
        let raw_password =
            RawPassword::new(input.password).map_err(|_| LoginFailure::WrongPassword)?;

        if !account
            .password_hash
            .verify(&raw_password, self.config.pepper())
        {
            return Err(LoginFailure::WrongPassword);
        }

        tracing::info!(identity = %account.identity(), "Password verified");

        Ok(LoginOutput {
            requires_otp: !account.verified,
        })
    }
}
