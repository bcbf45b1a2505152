//! Startup Bootstrap
//!
//! Idempotent creation of the initial admin account from configuration.
//! Runs once at process startup; a failure is reported but never blocks
//! the server from starting.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::provision_account;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::{
    account_password::RawPassword, account_role::AccountRole, email::Email,
};
use crate::error::{AuthError, AuthResult};
use crate::infra::cached_store::CachedCredentialStore;

/// Ensure-initial-admin use case
pub struct EnsureInitialAdminUseCase<S>
where
    S: CredentialStore + Sync,
{
    store: Arc<CachedCredentialStore<S>>,
    config: Arc<AuthConfig>,
}

impl<S> EnsureInitialAdminUseCase<S>
where
    S: CredentialStore + Sync,
{
    pub fn new(store: Arc<CachedCredentialStore<S>>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Create the configured admin account if it does not exist yet
    ///
    /// Returns `true` when an account was created on this call.
    pub async fn execute(&self) -> AuthResult<bool> {
        let Some(admin) = self.config.initial_admin.clone() else {
            tracing::debug!("No initial admin configured, skipping bootstrap");
            return Ok(false);
        };

        let email =
            Email::new(&admin.email).map_err(|e| AuthError::Validation(e.message().to_string()))?;
        let raw_password = RawPassword::new(admin.password)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        if self.store.read().await?.contains(email.as_str()) {
            tracing::info!(identity = %email, "Admin account already exists");
            return Ok(false);
        }

        let issuer = self.config.totp_issuer.clone();
        let pepper = self.config.password_pepper.clone();

        let created = self
            .store
            .mutate(move |accounts| {
                // Re-check inside the write lock
                if accounts.contains(email.as_str()) {
                    return Ok(false);
                }

                let mut account =
                    provision_account(email, None, &raw_password, pepper.as_deref(), &issuer)?;
                account.set_role(AccountRole::Admin);
                accounts.insert(account);
                Ok(true)
            })
            .await?;

        if created {
            tracing::info!(
                identity = %admin.email,
                "Initial admin account created; scan its enrollment QR to set up 2FA"
            );
        }

        Ok(created)
    }
}
