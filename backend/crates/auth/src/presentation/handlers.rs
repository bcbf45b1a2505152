//! HTTP Handlers

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use std::sync::Arc;

use platform::client::client_ip_label;

use crate::application::config::AuthConfig;
use crate::application::{
    AdminCreateUserInput, AdminCreateUserUseCase, AdminListUsersUseCase, CacheDiagnosticsInput,
    CacheDiagnosticsUseCase, LoginInput, LoginUseCase, RegisterInput, RegisterUseCase,
    VerifyTotpInput, VerifyTotpUseCase,
};
use crate::domain::repository::{AuditLog, CredentialStore};
use crate::error::{AuthError, AuthResult};
use crate::infra::cached_store::CachedCredentialStore;
use crate::presentation::dto::{
    AdminAddUserRequest, AdminAddUserResponse, AdminCreatedUser, AdminListRequest,
    AdminListResponse, AdminUserSummary, CacheDiagnosticsQuery, CacheDiagnosticsResponse,
    DebugTotpRequest, DebugTotpResponse, DiagnosticsCache, DiagnosticsData,
    DiagnosticsPerformance, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    RelayOtpRequest, VerifiedUser, VerifyTotpRequest, VerifyTotpResponse,
};

/// Shared state for auth handlers
pub struct AuthAppState<S, L>
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    pub store: Arc<CachedCredentialStore<S>>,
    pub audit: Arc<L>,
    pub config: Arc<AuthConfig>,
    pub http: reqwest::Client,
}

impl<S, L> Clone for AuthAppState<S, L>
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            audit: Arc::clone(&self.audit),
            config: Arc::clone(&self.config),
            http: self.http.clone(),
        }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /register
pub async fn register<S, L>(
    State(state): State<AuthAppState<S, L>>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<Json<RegisterResponse>>
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    let use_case = RegisterUseCase::new(
        state.store.clone(),
        state.audit.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            email: req.email,
            password: req.password,
            display_name: req.name,
            client_ip: client_ip_label(&headers, None),
        })
        .await?;

    Ok(Json(RegisterResponse {
        message: "User registered successfully".to_string(),
        qr_code: output.enrollment_qr,
        email: output.identity,
        secret: output.secret_debug,
    }))
}

// ============================================================================
// Login
// ============================================================================

/// POST /login
pub async fn login<S, L>(
    State(state): State<AuthAppState<S, L>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<LoginResponse>>
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    let use_case = LoginUseCase::new(
        state.store.clone(),
        state.audit.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
            client_ip: client_ip_label(&headers, None),
        })
        .await?;

    let message = if output.requires_otp {
        "Password valid, enter OTP"
    } else {
        "Password valid"
    };

    Ok(Json(LoginResponse {
        message: message.to_string(),
        requires_otp: output.requires_otp,
    }))
}

// ============================================================================
// Verify OTP
// ============================================================================

/// POST /verify-otp
pub async fn verify_totp<S, L>(
    State(state): State<AuthAppState<S, L>>,
    headers: HeaderMap,
    Json(req): Json<VerifyTotpRequest>,
) -> AuthResult<Json<VerifyTotpResponse>>
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    let use_case = VerifyTotpUseCase::new(
        state.store.clone(),
        state.audit.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(VerifyTotpInput {
            email: req.email,
            code: req.token,
            client_ip: client_ip_label(&headers, None),
        })
        .await?;

    Ok(Json(VerifyTotpResponse {
        message: "Login successful".to_string(),
        user: VerifiedUser {
            email: output.identity,
            name: output.display_name,
        },
    }))
}

// ============================================================================
// Cache diagnostics (admin/debug)
// ============================================================================

/// GET /cache-diagnosis
pub async fn cache_diagnostics<S, L>(
    State(state): State<AuthAppState<S, L>>,
    Query(query): Query<CacheDiagnosticsQuery>,
) -> AuthResult<Json<CacheDiagnosticsResponse>>
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    let use_case = CacheDiagnosticsUseCase::new(state.store.clone());

    let report = use_case
        .execute(CacheDiagnosticsInput {
            action: query.action,
            iterations: query.iterations,
        })
        .await?;

    Ok(Json(CacheDiagnosticsResponse {
        performance: DiagnosticsPerformance {
            file_time: format!("{}ms", report.store_time.as_millis()),
            cache_time: format!("{}ms", report.cache_time.as_millis()),
            speedup: report.speedup_percent.map(|pct| format!("{}% faster", pct)),
        },
        data: DiagnosticsData {
            cache_users: report.cache_users,
            file_users: report.store_users,
            matches: report.matches,
        },
        cache: DiagnosticsCache {
            size: report.cache_size,
            has_users: report.has_users,
        },
        action: report.action_applied,
    }))
}

// ============================================================================
// Admin (thin CRUD over the same store)
// ============================================================================

/// POST /admin/users
pub async fn admin_list_users<S, L>(
    State(state): State<AuthAppState<S, L>>,
    Json(req): Json<AdminListRequest>,
) -> AuthResult<Json<AdminListResponse>>
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    let use_case = AdminListUsersUseCase::new(state.store.clone());
    let accounts = use_case.execute(&req.admin_email).await?;

    let users = accounts
        .iter()
        .map(|account| AdminUserSummary {
            email: account.identity().to_string(),
            name: account.display_name.as_str().to_string(),
            role: account.role.code().to_string(),
            status: account.status.code().to_string(),
            is_verified: account.verified,
            created_at: account.created_at,
            updated_at: account.updated_at,
            last_login: account.last_login_at,
        })
        .collect();

    Ok(Json(AdminListResponse {
        success: true,
        users,
    }))
}

/// POST /admin/users/add
pub async fn admin_add_user<S, L>(
    State(state): State<AuthAppState<S, L>>,
    headers: HeaderMap,
    Json(req): Json<AdminAddUserRequest>,
) -> AuthResult<Json<AdminAddUserResponse>>
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    let use_case = AdminCreateUserUseCase::new(
        state.store.clone(),
        state.audit.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(AdminCreateUserInput {
            admin_email: req.admin_email,
            email: req.email,
            password: req.password,
            role: req.role,
            client_ip: client_ip_label(&headers, None),
        })
        .await?;

    Ok(Json(AdminAddUserResponse {
        success: true,
        message: "User created successfully".to_string(),
        user: AdminCreatedUser {
            email: output.identity,
            role: output.role.code().to_string(),
            status: "active".to_string(),
            qr_code: output.enrollment_qr,
        },
    }))
}

// ============================================================================
// OTP relay (pass-through proxy, no credential-store interaction)
// ============================================================================

/// POST /relay/otp
pub async fn relay_otp<S, L>(
    State(state): State<AuthAppState<S, L>>,
    Json(req): Json<RelayOtpRequest>,
) -> AuthResult<Response>
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    if req.email.trim().is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    let url = state
        .config
        .otp_relay_url
        .as_deref()
        .ok_or(AuthError::RelayNotConfigured)?;

    let upstream: serde_json::Value = state
        .http
        .post(url)
        .json(&serde_json::json!({"email": req.email}))
        .send()
        .await
        .map_err(|e| AuthError::Relay(e.to_string()))?
        .json()
        .await
        .map_err(|e| AuthError::Relay(e.to_string()))?;

    let success = upstream
        .get("success")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);

    if !success {
        let message = upstream
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("OTP not found");
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"success": false, "message": message})),
        )
            .into_response());
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "otp": upstream.get("otp"),
        "timestamp": upstream.get("timestamp"),
    }))
    .into_response())
}

// ============================================================================
// TOTP debug (registered only when the development flag is on)
// ============================================================================

/// POST /debug/totp
pub async fn debug_totp<S, L>(
    State(state): State<AuthAppState<S, L>>,
    Json(req): Json<DebugTotpRequest>,
) -> AuthResult<Response>
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    let accounts = state.store.read().await?;

    let Some(account) = accounts.get(&req.email) else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "User not found"})),
        )
            .into_response());
    };

    let issuer = &state.config.totp_issuer;
    let identity = account.identity();
    let now = Utc::now().timestamp().max(0) as u64;

    let code = |t: u64| {
        account
            .totp_secret
            .code_at(issuer, identity, t)
            .map_err(|e| AuthError::Internal(e.to_string()))
    };

    let response = DebugTotpResponse {
        email: identity.to_string(),
        secret: account.totp_secret.as_base32().to_string(),
        current_token: code(now)?,
        previous_token: code(now.saturating_sub(30))?,
        next_token: code(now + 30)?,
        server_time: Utc::now(),
    };

    Ok(Json(response).into_response())
}
