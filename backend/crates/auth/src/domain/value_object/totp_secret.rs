//! TOTP Secret Value Object
//!
//! Wraps the shared secret for time-based one-time passwords and owns every
//! TOTP computation: code generation, window verification, and the
//! enrollment artifact (QR data URL) handed out at registration.
//!
//! Uses Google Authenticator compatible settings (SHA-1, 6 digits, 30 s
//! step). The verification window is ±6 steps (±180 s) to absorb client
//! clock drift; narrowing it trades usability for replay resistance and
//! must be a deliberate decision.

use kernel::error::app_error::{AppError, AppResult};
use totp_rs::{Algorithm, Secret, TOTP};

/// TOTP configuration constants
const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
/// Accepted clock drift in steps on either side of "now"
const TOTP_SKEW: u8 = 6;

/// TOTP Secret for two-factor authentication
///
/// Generated exactly once per account at registration; there is no
/// rotation flow. Never logged and never serialized into client-facing
/// payloads outside explicit development-only surfaces.
#[derive(Clone, PartialEq, Eq)]
pub struct TotpSecret {
    /// Base32-encoded secret
    secret_base32: String,
}

impl TotpSecret {
    /// Generate a new random TOTP secret (160 bits of entropy)
    pub fn generate() -> Self {
        let secret = Secret::generate_secret();
        Self {
            secret_base32: secret.to_encoded().to_string(),
        }
    }

    /// Create from a base32-encoded string (from the credential store)
    pub fn from_base32(secret: impl Into<String>) -> AppResult<Self> {
        let secret_str = secret.into();
        // Validate by trying to decode
        Secret::Encoded(secret_str.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {:?}", e)))?;

        Ok(Self {
            secret_base32: secret_str,
        })
    }

    /// Get the base32-encoded secret for storage
    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    /// Create a TOTP instance for this secret
    fn to_totp(&self, issuer: &str, account_name: &str) -> AppResult<TOTP> {
        let secret = Secret::Encoded(self.secret_base32.clone());

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            secret
                .to_bytes()
                .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {:?}", e)))?,
            Some(issuer.to_string()),
            account_name.to_string(),
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {}", e)))
    }

    /// Verify a code against the window around an explicit Unix timestamp
    ///
    /// Every step offset in the closed ±6-step window is checked; the result
    /// does not reveal which offset matched.
    pub fn verify_at(
        &self,
        code: &str,
        issuer: &str,
        account_name: &str,
        unix_time: u64,
    ) -> AppResult<bool> {
        let totp = self.to_totp(issuer, account_name)?;
        Ok(totp.check(code, unix_time))
    }

    /// Verify a code against the window around the current system time
    pub fn verify_current(&self, code: &str, issuer: &str, account_name: &str) -> AppResult<bool> {
        let totp = self.to_totp(issuer, account_name)?;
        Ok(totp.check_current(code).unwrap_or(false))
    }

    /// Generate the 6-digit zero-padded code for an explicit Unix timestamp
    pub fn code_at(&self, issuer: &str, account_name: &str, unix_time: u64) -> AppResult<String> {
        let totp = self.to_totp(issuer, account_name)?;
        Ok(totp.generate(unix_time))
    }

    /// Generate the code for the current system time
    pub fn current_code(&self, issuer: &str, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(issuer, account_name)?;
        totp.generate_current()
            .map_err(|e| AppError::internal(format!("Failed to generate TOTP: {}", e)))
    }

    /// Render the enrollment artifact: the provisioning URI as a scannable
    /// QR code, packaged as a `data:image/png;base64,` URL
    pub fn enrollment_artifact(&self, issuer: &str, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(issuer, account_name)?;
        let qr = totp
            .get_qr_base64()
            .map_err(|e| AppError::internal(format!("Failed to generate QR code: {}", e)))?;
        Ok(format!("data:image/png;base64,{}", qr))
    }

    /// Get the otpauth:// URL for manual entry
    pub fn otpauth_url(&self, issuer: &str, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(issuer, account_name)?;
        Ok(totp.get_url())
    }
}

impl std::fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpSecret")
            .field("secret_base32", &"[SECRET]")
            .finish()
    }
}
