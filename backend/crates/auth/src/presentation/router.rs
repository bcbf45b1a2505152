//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{AuditLog, CredentialStore};
use crate::infra::audit_log::FileAuditLog;
use crate::infra::cached_store::CachedCredentialStore;
use crate::infra::file_store::JsonFileStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_shared_key;

/// Create the auth router backed by the flat-file store and audit log
/// named in the configuration
pub fn auth_router(config: AuthConfig) -> Router {
    let store = JsonFileStore::new(&config.users_file);
    let cached = CachedCredentialStore::new(store, config.cache_ttl);
    let audit = FileAuditLog::new(&config.audit_log_file, config.log_retention);

    auth_router_generic(cached, audit, config)
}

/// Create the auth router for any store/audit-log implementation
pub fn auth_router_generic<S, L>(
    store: CachedCredentialStore<S>,
    audit: L,
    config: AuthConfig,
) -> Router
where
    S: CredentialStore + Sync + Send + 'static,
    L: AuditLog + Sync + Send + 'static,
{
    let config = Arc::new(config);
    let state = AuthAppState {
        store: Arc::new(store),
        audit: Arc::new(audit),
        config: Arc::clone(&config),
        http: reqwest::Client::new(),
    };

    let mut router = Router::new()
        .route("/register", post(handlers::register::<S, L>))
        .route("/login", post(handlers::login::<S, L>))
        .route("/verify-otp", post(handlers::verify_totp::<S, L>))
        .route("/cache-diagnosis", get(handlers::cache_diagnostics::<S, L>))
        .route("/admin/users", post(handlers::admin_list_users::<S, L>))
        .route("/admin/users/add", post(handlers::admin_add_user::<S, L>))
        .route("/relay/otp", post(handlers::relay_otp::<S, L>));

    // The debug surface exists only when the development flag is on; the
    // production router never registers the route at all.
    if config.dev_expose_totp_debug {
        router = router.route("/debug/totp", post(handlers::debug_totp::<S, L>));
    }

    router
        .layer(axum::middleware::from_fn_with_state(
            config,
            require_shared_key,
        ))
        .with_state(state)
}
