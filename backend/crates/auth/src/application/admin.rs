//! Admin Use Cases
//!
//! Thin CRUD layer over the same credential store: list accounts and
//! create accounts with an explicit role. Every operation is guarded by an
//! admin-identity check against the store itself.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{provision_account, record_audit};
use crate::domain::entity::account::Account;
use crate::domain::entity::audit_event::{AuditAction, AuditEvent, AuditOutcome, AuditReason};
use crate::domain::repository::{AuditLog, CredentialStore};
use crate::domain::value_object::{
    account_password::RawPassword, account_role::AccountRole, email::Email,
};
use crate::error::{AuthError, AuthResult};
use crate::infra::cached_store::CachedCredentialStore;

/// Admin create input
pub struct AdminCreateUserInput {
    /// Identity of the requesting admin
    pub admin_email: String,
    pub email: String,
    pub password: String,
    /// Role code, defaults to `user`
    pub role: Option<String>,
    pub client_ip: String,
}

/// Admin create output
pub struct AdminCreateUserOutput {
    pub identity: String,
    pub role: AccountRole,
    pub enrollment_qr: String,
}

/// Admin create-user use case
pub struct AdminCreateUserUseCase<S, L>
where
    S: CredentialStore + Sync,
    L: AuditLog,
{
    store: Arc<CachedCredentialStore<S>>,
    audit: Arc<L>,
    config: Arc<AuthConfig>,
}

impl<S, L> AdminCreateUserUseCase<S, L>
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

    pub async fn execute(&self, input: AdminCreateUserInput) -> AuthResult<AdminCreateUserOutput> {
        let identity = input.email.clone();
        let ip = input.client_ip.clone();
        let created_by = input.admin_email.clone();

        let result = self.try_execute(input).await;

        // Administrative creates audit successes only; the admin gate
        // already rejected everything else before any state change.
        if let Ok(output) = &result {
            record_audit(
                self.audit.as_ref(),
                AuditEvent::new(
                    AuditAction::Register,
                    identity,
                    AuditOutcome::Success,
                    AuditReason::UserCreatedByAdmin,
                    serde_json::json!({
                        "ip": ip,
                        "created_by": created_by,
                        "role": output.role.code(),
                    }),
                ),
            )
            .await;
        }

        result
    }

    async fn try_execute(&self, input: AdminCreateUserInput) -> AuthResult<AdminCreateUserOutput> {
        require_admin(&self.store, &input.admin_email).await?;

        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let email =
            Email::new(&input.email).map_err(|e| AuthError::Validation(e.message().to_string()))?;
        let raw_password = RawPassword::new(input.password)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;
        let role = match input.role.as_deref() {
            None | Some("") => AccountRole::User,
            Some(code) => AccountRole::from_code(code)
                .ok_or_else(|| AuthError::Validation(format!("Unknown role: {}", code)))?,
        };

        let issuer = self.config.totp_issuer.clone();
        let pepper = self.config.password_pepper.clone();

        let output = self
            .store
            .mutate(move |accounts| {
                if accounts.contains(email.as_str()) {
                    return Err(AuthError::AccountExists);
                }

                let mut account =
                    provision_account(email, None, &raw_password, pepper.as_deref(), &issuer)?;
                account.set_role(role);

                let identity = account.identity().to_string();
                let enrollment_qr = account.enrollment_qr.clone();
                accounts.insert(account);

                Ok(AdminCreateUserOutput {
                    identity,
                    role,
                    enrollment_qr,
                })
            })
            .await?;

        tracing::info!(identity = %output.identity, role = %output.role, "User created by admin");

        Ok(output)
    }
}

/// Admin list-users use case
pub struct AdminListUsersUseCase<S>
where
    S: CredentialStore + Sync,
{
    store: Arc<CachedCredentialStore<S>>,
}

impl<S> AdminListUsersUseCase<S>
where
    S: CredentialStore + Sync,
{
    pub fn new(store: Arc<CachedCredentialStore<S>>) -> Self {
        Self { store }
    }

    /// List every account, in identity order
    ///
    /// The caller (presentation) is responsible for projecting these into a
    /// sanitized view; hashes and secrets never appear in a response.
    pub async fn execute(&self, admin_email: &str) -> AuthResult<Vec<Account>> {
        require_admin(&self.store, admin_email).await?;

        let accounts = self.store.read().await?;
        Ok(accounts.iter().cloned().collect())
    }
}

/// Resolve the requesting identity and require an active admin account
async fn require_admin<S>(
    store: &CachedCredentialStore<S>,
    admin_email: &str,
) -> AuthResult<()>
where
    S: CredentialStore + Sync,
{
    if admin_email.trim().is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    let accounts = store.read().await?;
    match accounts.get(admin_email) {
        Some(account) if account.is_active_admin() => Ok(()),
        _ => Err(AuthError::AdminRequired),
    }
}
