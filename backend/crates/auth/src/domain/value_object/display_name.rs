//! Display Name Value Object
//!
//! Human-facing account label. Unlike the email identity it carries no
//! uniqueness requirement; when the caller does not supply one it defaults
//! to the identity itself.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::value_object::email::Email;

/// Maximum display name length (in characters)
pub const DISPLAY_NAME_MAX_LENGTH: usize = 64;

/// Display name value object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// Create a new display name with validation
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        let name = name.into().trim().to_string();

        if name.is_empty() {
            return Err(AppError::bad_request("Display name cannot be empty"));
        }

        if name.chars().count() > DISPLAY_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Display name must be at most {} characters",
                DISPLAY_NAME_MAX_LENGTH
            )));
        }

        if name.chars().any(|c| c.is_control()) {
            return Err(AppError::bad_request(
                "Display name contains invalid control characters",
            ));
        }

        Ok(Self(name))
    }

    /// Default display name derived from the account identity
    pub fn derived_from(email: &Email) -> Self {
        Self(email.as_str().to_string())
    }

    /// Create from the credential store (assumed already validated)
    pub fn from_store(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the display name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
