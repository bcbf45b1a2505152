//! Flat-File Credential Store
//!
//! Whole-collection JSON persistence. The file is the single source of
//! truth; reads parse and validate everything, writes replace the file
//! atomically (temp file + rename) so a crash mid-write can never leave a
//! half-written collection behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::account::{Account, AccountCollection};
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::{
    account_password::AccountPassword, account_role::AccountRole, account_status::AccountStatus,
    display_name::DisplayName, email::Email, totp_secret::TotpSecret,
};
use crate::error::{AuthError, AuthResult};

/// JSON-file-backed credential store
#[derive(Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for JsonFileStore {
    async fn load_all(&self) -> AuthResult<AccountCollection> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            // First run: materialize an empty collection
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AccountCollection::new());
            }
            Err(e) => return Err(AuthError::Store(e)),
        };

        // Corruption is fatal to the request, never auto-healed: a
        // write-through after fabricating `{}` would overwrite a file that
        // may still be recoverable.
        let stored: StoredCollection = serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Credential store file is unparsable"
            );
            AuthError::StoreCorrupted(e.to_string())
        })?;

        stored.into_domain()
    }

    async fn save_all(&self, accounts: &AccountCollection) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let stored = StoredCollection::from_domain(accounts);
        let json = serde_json::to_string_pretty(&stored)?;

        // Write-then-rename keeps the previous collection intact until the
        // new one is fully on disk.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

// ============================================================================
// Storage representation
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct StoredCollection {
    accounts: BTreeMap<String, StoredAccount>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredAccount {
    display_name: String,
    password_hash: String,
    totp_secret: String,
    enrollment_qr: String,
    verified: bool,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl StoredCollection {
    fn from_domain(accounts: &AccountCollection) -> Self {
        Self {
            accounts: accounts
                .iter()
                .map(|account| {
                    (
                        account.identity().to_string(),
                        StoredAccount::from_domain(account),
                    )
                })
                .collect(),
        }
    }

    fn into_domain(self) -> AuthResult<AccountCollection> {
        let mut collection = AccountCollection::new();
        for (identity, stored) in self.accounts {
            collection.insert(stored.into_domain(identity)?);
        }
        Ok(collection)
    }
}

impl StoredAccount {
    fn from_domain(account: &Account) -> Self {
        Self {
            display_name: account.display_name.as_str().to_string(),
            password_hash: account.password_hash.as_phc_string().to_string(),
            totp_secret: account.totp_secret.as_base32().to_string(),
            enrollment_qr: account.enrollment_qr.clone(),
            verified: account.verified,
            role: account.role.code().to_string(),
            status: account.status.code().to_string(),
            created_at: account.created_at,
            updated_at: account.updated_at,
            last_login_at: account.last_login_at,
        }
    }

    /// Rebuild the domain record, surfacing invalid stored material as
    /// corruption rather than absence
    fn into_domain(self, identity: String) -> AuthResult<Account> {
        let corrupted =
            |what: &str| AuthError::StoreCorrupted(format!("{} for account {}", what, identity));

        let password_hash = AccountPassword::from_phc_string(self.password_hash)
            .map_err(|_| corrupted("invalid password hash"))?;
        let totp_secret = TotpSecret::from_base32(self.totp_secret)
            .map_err(|_| corrupted("invalid TOTP secret"))?;
        let role =
            AccountRole::from_code(&self.role).ok_or_else(|| corrupted("unknown role code"))?;
        let status = AccountStatus::from_code(&self.status)
            .ok_or_else(|| corrupted("unknown status code"))?;

        Ok(Account {
            email: Email::from_store(identity),
            display_name: DisplayName::from_store(self.display_name),
            password_hash,
            totp_secret,
            enrollment_qr: self.enrollment_qr,
            verified: self.verified,
            role,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login_at: self.last_login_at,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::account_password::RawPassword;

    fn sample_account(identity: &str) -> Account {
        let email = Email::new(identity).unwrap();
        let raw = RawPassword::new("longpassword1".to_string()).unwrap();
        let hash = AccountPassword::from_raw(&raw, None).unwrap();
        let secret = TotpSecret::generate();
        let qr = "data:image/png;base64,Zg==".to_string();
        Account::new(email, None, hash, secret, qr)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("users.json"));

        let collection = store.load_all().await.unwrap();
        assert!(collection.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("users.json"));

        let mut collection = AccountCollection::new();
        let mut account = sample_account("a@x.com");
        account.mark_verified();
        account.set_role(AccountRole::Admin);
        collection.insert(account);
        collection.insert(sample_account("b@x.com"));

        store.save_all(&collection).await.unwrap();
        let loaded = store.load_all().await.unwrap();

        assert_eq!(loaded, collection);
        let admin = loaded.get("a@x.com").unwrap();
        assert!(admin.verified);
        assert_eq!(admin.role, AccountRole::Admin);
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileStore::new(&path);

        store.save_all(&AccountCollection::new()).await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let store = JsonFileStore::new(&path);
        let result = store.load_all().await;

        assert!(matches!(result, Err(AuthError::StoreCorrupted(_))));
        // The corrupted file itself is untouched
        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(raw, "{ not json");
    }

    #[tokio::test]
    async fn test_invalid_stored_hash_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileStore::new(&path);

        let mut collection = AccountCollection::new();
        collection.insert(sample_account("a@x.com"));
        store.save_all(&collection).await.unwrap();

        // Break the stored password hash in place
        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        value["accounts"]["a@x.com"]["password_hash"] = serde_json::json!("garbage");
        tokio::fs::write(&path, serde_json::to_string(&value).unwrap())
            .await
            .unwrap();

        let result = store.load_all().await;
        assert!(matches!(result, Err(AuthError::StoreCorrupted(_))));
    }
}
