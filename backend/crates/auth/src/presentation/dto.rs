//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Register
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Optional display name, defaults to the email
    pub name: Option<String>,
}

/// Register response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    /// Enrollment artifact: QR code as a data:image/png;base64 URL
    pub qr_code: String,
    pub email: String,
    /// Raw TOTP secret - development debug builds only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    /// True until the account completes its first OTP verification
    pub requires_otp: bool,
}

// ============================================================================
// Verify OTP
// ============================================================================

/// Verify request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTotpRequest {
    #[serde(default)]
    pub email: String,
    /// Candidate 6-digit code
    #[serde(default)]
    pub token: String,
}

/// Verified user block inside the verify response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedUser {
    pub email: String,
    pub name: String,
}

/// Verify response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTotpResponse {
    pub message: String,
    pub user: VerifiedUser,
}

// ============================================================================
// Cache diagnostics
// ============================================================================

/// Query parameters for the diagnostics endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDiagnosticsQuery {
    pub action: Option<String>,
    pub iterations: Option<u32>,
}

/// Timing comparison block
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsPerformance {
    pub file_time: String,
    pub cache_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speedup: Option<String>,
}

/// Record count comparison block
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsData {
    pub cache_users: usize,
    pub file_users: usize,
    pub matches: bool,
}

/// Cache state block
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsCache {
    pub size: usize,
    pub has_users: bool,
}

/// Cache diagnostics response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDiagnosticsResponse {
    pub performance: DiagnosticsPerformance,
    pub data: DiagnosticsData,
    pub cache: DiagnosticsCache,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

// ============================================================================
// Admin
// ============================================================================

/// Admin list request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListRequest {
    #[serde(default)]
    pub admin_email: String,
}

/// Sanitized account view: no hash, no secret, no artifact
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserSummary {
    pub email: String,
    pub name: String,
    pub role: String,
    pub status: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Admin list response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListResponse {
    pub success: bool,
    pub users: Vec<AdminUserSummary>,
}

/// Admin create request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAddUserRequest {
    #[serde(default)]
    pub admin_email: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

/// Created account block inside the admin create response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreatedUser {
    pub email: String,
    pub role: String,
    pub status: String,
    pub qr_code: String,
}

/// Admin create response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAddUserResponse {
    pub success: bool,
    pub message: String,
    pub user: AdminCreatedUser,
}

// ============================================================================
// OTP relay (pass-through)
// ============================================================================

/// Relay request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayOtpRequest {
    #[serde(default)]
    pub email: String,
}

// ============================================================================
// TOTP debug (development only)
// ============================================================================

/// Debug request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugTotpRequest {
    #[serde(default)]
    pub email: String,
}

/// Debug response: the codes an authenticator would show right now
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugTotpResponse {
    pub email: String,
    pub secret: String,
    pub current_token: String,
    pub previous_token: String,
    pub next_token: String,
    pub server_time: DateTime<Utc>,
}
