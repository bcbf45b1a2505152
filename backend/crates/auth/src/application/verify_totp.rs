//! Verify TOTP Use Case
//!
//! Second authentication factor: validates a one-time code against the
//! account's shared secret within the ±6-step window. The first success
//! flips the account's `verified` flag and writes it through store and
//! cache; failures never alter stored state.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::record_audit;
use crate::domain::entity::audit_event::{AuditAction, AuditEvent, AuditOutcome, AuditReason};
use crate::domain::repository::{AuditLog, CredentialStore};
use crate::error::{AuthError, AuthResult};
use crate::infra::cached_store::CachedCredentialStore;

/// Verify input
pub struct VerifyTotpInput {
    pub email: String,
    pub code: String,
    pub client_ip: String,
}

/// Verify output
pub struct VerifyTotpOutput {
    pub identity: String,
    pub display_name: String,
}

/// Verify TOTP use case
pub struct VerifyTotpUseCase<S, L>
where
    S: CredentialStore + Sync,
    L: AuditLog,
{
    store: Arc<CachedCredentialStore<S>>,
    audit: Arc<L>,
    config: Arc<AuthConfig>,
}

impl<S, L> VerifyTotpUseCase<S, L>
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

    /// Verify against the current system time
    pub async fn execute(&self, input: VerifyTotpInput) -> AuthResult<VerifyTotpOutput> {
        let now = Utc::now().timestamp().max(0) as u64;
        self.execute_at(input, now).await
    }

    /// Verify against an explicit Unix timestamp
    pub async fn execute_at(
        &self,
        input: VerifyTotpInput,
        now_unix: u64,
    ) -> AuthResult<VerifyTotpOutput> {
        let identity = input.email.clone();
        let ip = input.client_ip.clone();
        let provided_code = input.code.clone();

        let result = self.try_execute_at(input, now_unix).await;

        let (outcome, reason, metadata) = match &result {
            Ok(_) => (
                AuditOutcome::Success,
                AuditReason::OtpVerified,
                serde_json::json!({"ip": ip, "method": "totp"}),
            ),
            Err(AuthError::MissingCredentials) => (
                AuditOutcome::Failure,
                AuditReason::MissingCredentials,
                serde_json::json!({"ip": ip, "method": "totp"}),
            ),
            Err(AuthError::UserNotFound) => (
                AuditOutcome::Failure,
                AuditReason::UserNotFound,
                serde_json::json!({"ip": ip, "method": "totp"}),
            ),
            Err(AuthError::InvalidTotp) => (
                AuditOutcome::Failure,
                AuditReason::InvalidOrExpiredTotp,
                serde_json::json!({"ip": ip, "method": "totp", "provided_code": provided_code}),
            ),
            Err(e) => (
                AuditOutcome::Error,
                AuditReason::InternalError,
                serde_json::json!({"ip": ip, "method": "totp", "error": e.to_string()}),
            ),
        };
        record_audit(
            self.audit.as_ref(),
            AuditEvent::new(AuditAction::VerifyTotp, identity, outcome, reason, metadata),
        )
        .await;

        result
    }

    async fn try_execute_at(
        &self,
        input: VerifyTotpInput,
        now_unix: u64,
    ) -> AuthResult<VerifyTotpOutput> {
        if input.email.trim().is_empty() || input.code.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let issuer = self.config.totp_issuer.clone();
        let email = input.email;
        let code = input.code;

        let output = self
            .store
            .mutate(move |accounts| {
                let account = accounts.get_mut(&email).ok_or(AuthError::UserNotFound)?;

                let valid = account
                    .totp_secret
                    .verify_at(&code, &issuer, account.email.as_str(), now_unix)
                    .map_err(|e| AuthError::Internal(e.to_string()))?;

                if !valid {
                    return Err(AuthError::InvalidTotp);
                }

                // First success flips the flag; repeats only refresh the
                // login timestamp.
                account.mark_verified();

                Ok(VerifyTotpOutput {
                    identity: account.identity().to_string(),
                    display_name: account.display_name.as_str().to_string(),
                })
            })
            .await?;

        tracing::info!(identity = %output.identity, "TOTP verified");

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::register::{RegisterInput, RegisterUseCase};
    use crate::infra::audit_log::FileAuditLog;
    use crate::infra::file_store::JsonFileStore;
    use std::time::Duration;

    /// Fixed base time for deterministic window checks
    const NOW: u64 = 1_700_000_000;
    const STEP: i64 = 30;

    struct Fixture {
        store: Arc<CachedCredentialStore<JsonFileStore>>,
        audit: Arc<FileAuditLog>,
        config: Arc<AuthConfig>,
    }

    impl Fixture {
        fn new(dir: &tempfile::TempDir) -> Self {
            let store = JsonFileStore::new(dir.path().join("users.json"));
            Self {
                store: Arc::new(CachedCredentialStore::new(store, Duration::from_secs(60))),
                audit: Arc::new(FileAuditLog::new(dir.path().join("audit.json"), None)),
                config: Arc::new(AuthConfig::default()),
            }
        }

        async fn register(&self, email: &str) {
            RegisterUseCase::new(self.store.clone(), self.audit.clone(), self.config.clone())
                .execute(RegisterInput {
                    email: email.to_string(),
                    password: "longpassword1".to_string(),
                    display_name: None,
                    client_ip: "127.0.0.1".to_string(),
                })
                .await
                .unwrap();
        }

        fn verify(&self) -> VerifyTotpUseCase<JsonFileStore, FileAuditLog> {
            VerifyTotpUseCase::new(self.store.clone(), self.audit.clone(), self.config.clone())
        }

        /// Code as an authenticator would compute it at `offset_steps`
        /// from the fixed base time
        async fn code_at_offset(&self, email: &str, offset_steps: i64) -> String {
            let accounts = self.store.read().await.unwrap();
            let account = accounts.get(email).unwrap();
            let t = (NOW as i64 + offset_steps * STEP) as u64;
            account
                .totp_secret
                .code_at(&self.config.totp_issuer, email, t)
                .unwrap()
        }
    }

    fn input(email: &str, code: &str) -> VerifyTotpInput {
        VerifyTotpInput {
            email: email.to_string(),
            code: code.to_string(),
            client_ip: "127.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_code_within_skew_verifies_and_sets_flag() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::new(&dir);
        fixture.register("a@x.com").await;

        // 90 seconds in the future, well inside the ±180 s window
        let code = fixture.code_at_offset("a@x.com", 3).await;
        let output = fixture
            .verify()
            .execute_at(input("a@x.com", &code), NOW)
            .await
            .unwrap();

        assert_eq!(output.identity, "a@x.com");
        let accounts = fixture.store.read().await.unwrap();
        assert!(accounts.get("a@x.com").unwrap().verified);
    }

    #[tokio::test]
    async fn test_code_outside_skew_fails_without_state_change() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::new(&dir);
        fixture.register("a@x.com").await;

        // 210 seconds in the future: one step past the window
        let code = fixture.code_at_offset("a@x.com", 7).await;
        let result = fixture
            .verify()
            .execute_at(input("a@x.com", &code), NOW)
            .await;

        assert!(matches!(result, Err(AuthError::InvalidTotp)));
        let accounts = fixture.store.read().await.unwrap();
        assert!(!accounts.get("a@x.com").unwrap().verified);
    }

    #[tokio::test]
    async fn test_unknown_identity_is_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::new(&dir);
        fixture.register("a@x.com").await;

        let result = fixture
            .verify()
            .execute_at(input("ghost@x.com", "000000"), NOW)
            .await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_verified_flag_is_monotone_across_repeat_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::new(&dir);
        fixture.register("a@x.com").await;

        let code = fixture.code_at_offset("a@x.com", 0).await;
        fixture
            .verify()
            .execute_at(input("a@x.com", &code), NOW)
            .await
            .unwrap();

        // A later failure must not reset the flag
        let _ = fixture
            .verify()
            .execute_at(input("a@x.com", "000000"), NOW)
            .await;
        let accounts = fixture.store.read().await.unwrap();
        assert!(accounts.get("a@x.com").unwrap().verified);

        // A repeat success keeps it true and still succeeds
        let code = fixture.code_at_offset("a@x.com", 1).await;
        fixture
            .verify()
            .execute_at(input("a@x.com", &code), NOW)
            .await
            .unwrap();
        let accounts = fixture.store.read().await.unwrap();
        assert!(accounts.get("a@x.com").unwrap().verified);
    }

    #[tokio::test]
    async fn test_audit_reasons_for_verify_paths() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::new(&dir);
        fixture.register("a@x.com").await;
        fixture.audit.clear().await.unwrap();

        let code = fixture.code_at_offset("a@x.com", 0).await;
        fixture
            .verify()
            .execute_at(input("a@x.com", &code), NOW)
            .await
            .unwrap();
        let _ = fixture
            .verify()
            .execute_at(input("a@x.com", "999999999"), NOW)
            .await;
        let _ = fixture
            .verify()
            .execute_at(input("ghost@x.com", "123456"), NOW)
            .await;
        let _ = fixture.verify().execute_at(input("a@x.com", ""), NOW).await;

        let events = fixture.audit.read_all().await.unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].reason.code(), "otp_verified");
        assert_eq!(events[1].reason.code(), "invalid_or_expired_totp");
        assert_eq!(events[2].reason.code(), "user_not_found");
        assert_eq!(events[3].reason.code(), "missing_credentials");
    }
}
