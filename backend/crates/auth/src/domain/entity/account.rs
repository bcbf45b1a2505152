//! Account Entity
//!
//! One credential record per identity: the password hash, the TOTP secret
//! provisioned at creation, the enrollment artifact, and the verification
//! state, plus informational timestamps and authorization attributes.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::domain::value_object::{
    account_password::AccountPassword, account_role::AccountRole, account_status::AccountStatus,
    display_name::DisplayName, email::Email, totp_secret::TotpSecret,
};

/// Account credential record
///
/// `email` is the identity and store key, immutable after creation.
/// `totp_secret` is generated exactly once at creation; there is no
/// rotation flow. `enrollment_qr` is derived from the secret at creation
/// and kept as an opaque artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Unique identity (store key), immutable
    pub email: Email,
    /// Human-facing label, defaults to the identity
    pub display_name: DisplayName,
    /// Argon2id hash, never the plaintext
    pub password_hash: AccountPassword,
    /// Base32 shared secret, provisioned once
    pub totp_secret: TotpSecret,
    /// QR data URL rendered from the provisioning URI at creation
    pub enrollment_qr: String,
    /// Set true exactly once, on first successful OTP validation
    pub verified: bool,
    /// Authorization role (user/admin)
    pub role: AccountRole,
    /// Account status (active/disabled)
    pub status: AccountStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
    /// Last completed (OTP-verified) login time
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new unverified account
    pub fn new(
        email: Email,
        display_name: Option<DisplayName>,
        password_hash: AccountPassword,
        totp_secret: TotpSecret,
        enrollment_qr: String,
    ) -> Self {
        let now = Utc::now();
        let display_name = display_name.unwrap_or_else(|| DisplayName::derived_from(&email));

        Self {
            email,
            display_name,
            password_hash,
            totp_secret,
            enrollment_qr,
            verified: false,
            role: AccountRole::default(),
            status: AccountStatus::default(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// Identity as a plain string slice
    pub fn identity(&self) -> &str {
        self.email.as_str()
    }

    /// Record a successful OTP verification
    ///
    /// The flag only ever transitions false→true; repeated verifications
    /// keep it true and just refresh the login timestamp.
    pub fn mark_verified(&mut self) {
        let now = Utc::now();
        self.verified = true;
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Update the authorization role
    pub fn set_role(&mut self, role: AccountRole) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    /// Check if the account may authenticate
    pub fn can_login(&self) -> bool {
        self.status.can_login()
    }

    /// Check if the account is an active admin
    pub fn is_active_admin(&self) -> bool {
        self.role.is_admin() && self.status.can_login()
    }
}

/// The whole credential collection, keyed by identity
///
/// The store persists and the cache holds this as a single unit; all
/// lookups and mutations go through the identity key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountCollection {
    accounts: BTreeMap<String, Account>,
}

impl AccountCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an account by identity (case-sensitive)
    pub fn get(&self, identity: &str) -> Option<&Account> {
        self.accounts.get(identity)
    }

    /// Mutable lookup by identity
    pub fn get_mut(&mut self, identity: &str) -> Option<&mut Account> {
        self.accounts.get_mut(identity)
    }

    /// Check whether an identity exists
    pub fn contains(&self, identity: &str) -> bool {
        self.accounts.contains_key(identity)
    }

    /// Insert an account under its identity
    ///
    /// Returns the previous record if one existed; callers enforcing the
    /// uniqueness invariant must check [`Self::contains`] first.
    pub fn insert(&mut self, account: Account) -> Option<Account> {
        self.accounts
            .insert(account.identity().to_string(), account)
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterate accounts in identity order
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::account_password::RawPassword;

    fn sample_account(identity: &str) -> Account {
        let email = Email::new(identity).unwrap();
        let raw = RawPassword::new("longpassword1".to_string()).unwrap();
        let hash = AccountPassword::from_raw(&raw, None).unwrap();
        let secret = TotpSecret::generate();
        Account::new(email, None, hash, secret, "data:image/png;base64,Zg==".to_string())
    }

    #[test]
    fn test_new_account_defaults() {
        let account = sample_account("a@x.com");
        assert_eq!(account.identity(), "a@x.com");
        assert_eq!(account.display_name.as_str(), "a@x.com");
        assert!(!account.verified);
        assert_eq!(account.role, AccountRole::User);
        assert_eq!(account.status, AccountStatus::Active);
        assert!(account.last_login_at.is_none());
    }

    #[test]
    fn test_mark_verified_is_monotone() {
        let mut account = sample_account("a@x.com");

        account.mark_verified();
        assert!(account.verified);
        let first_login = account.last_login_at;
        assert!(first_login.is_some());

        // A second verification never resets the flag
        account.mark_verified();
        assert!(account.verified);
    }

    #[test]
    fn test_collection_lookup_is_case_sensitive() {
        let mut collection = AccountCollection::new();
        collection.insert(sample_account("Alice@x.com"));

        assert!(collection.contains("Alice@x.com"));
        assert!(!collection.contains("alice@x.com"));
    }

    #[test]
    fn test_collection_insert_and_iter() {
        let mut collection = AccountCollection::new();
        assert!(collection.is_empty());

        collection.insert(sample_account("b@x.com"));
        collection.insert(sample_account("a@x.com"));
        assert_eq!(collection.len(), 2);

        let identities: Vec<&str> = collection.iter().map(|a| a.identity()).collect();
        assert_eq!(identities, vec!["a@x.com", "b@x.com"]);
    }
}
