//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use platform::cache::DEFAULT_TTL;

/// Default audit-log retention horizon (30 days)
pub const DEFAULT_LOG_RETENTION: Duration = Duration::from_secs(30 * 24 * 3600);

/// Credentials for the bootstrap admin account created at startup
#[derive(Clone)]
pub struct InitialAdmin {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for InitialAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitialAdmin")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Credential store file
    pub users_file: PathBuf,
    /// Audit log file
    pub audit_log_file: PathBuf,
    /// TTL for the cached credential collection
    pub cache_ttl: Duration,
    /// Pre-shared application key checked by the gate middleware.
    /// `None` means misconfigured: gated routes answer 500.
    pub shared_key: Option<String>,
    /// Issuer label embedded in provisioning URIs
    pub totp_issuer: String,
    /// Audit-log retention horizon; `None` retains everything
    pub log_retention: Option<Duration>,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Upstream URL for the OTP relay pass-through
    pub otp_relay_url: Option<String>,
    /// DEVELOPMENT ONLY: expose TOTP debug surfaces (debug code endpoint,
    /// secret echoed in the register response). Must stay off in any
    /// production configuration.
    pub dev_expose_totp_debug: bool,
    /// Admin account to create at startup if absent
    pub initial_admin: Option<InitialAdmin>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users_file: PathBuf::from("data/users.json"),
            audit_log_file: PathBuf::from("data/logs/audit.json"),
            cache_ttl: DEFAULT_TTL,
            shared_key: None,
            totp_issuer: "OTP-App".to_string(),
            log_retention: Some(DEFAULT_LOG_RETENTION),
            password_pepper: None,
            otp_relay_url: None,
            dev_expose_totp_debug: false,
            initial_admin: None,
        }
    }
}

impl AuthConfig {
    /// Create config for development: fixed shared key, debug surfaces on
    pub fn development() -> Self {
        Self {
            shared_key: Some("dev-app-key".to_string()),
            dev_expose_totp_debug: true,
            ..Default::default()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
