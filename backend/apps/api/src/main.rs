//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors use `kernel::error::AppError` via the auth crate.

use auth::application::EnsureInitialAdminUseCase;
use auth::config::{AuthConfig, InitialAdmin};
use auth::{CachedCredentialStore, JsonFileStore, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config();

    if config.shared_key.is_none() {
        tracing::warn!(
            "SHARED_KEY is not set; every gated route will answer 500 until it is configured"
        );
    }

    // Startup bootstrap: create the initial admin account if configured.
    // Errors here should not prevent server startup.
    let bootstrap_store = CachedCredentialStore::new(
        JsonFileStore::new(&config.users_file),
        config.cache_ttl,
    );
    let bootstrap =
        EnsureInitialAdminUseCase::new(Arc::new(bootstrap_store), Arc::new(config.clone()));
    match bootstrap.execute().await {
        Ok(created) => {
            if created {
                tracing::info!("Initial admin account bootstrapped");
            }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Initial admin bootstrap failed, continuing anyway"
            );
        }
    }

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-app-key"),
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(config))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Assemble the auth configuration from the environment
fn load_config() -> AuthConfig {
    let mut config = AuthConfig::default();

    if let Ok(path) = env::var("USERS_FILE") {
        config.users_file = PathBuf::from(path);
    }
    if let Ok(path) = env::var("AUDIT_LOG_FILE") {
        config.audit_log_file = PathBuf::from(path);
    }
    if let Ok(secs) = env::var("CACHE_TTL_SECS") {
        if let Ok(secs) = secs.parse::<u64>() {
            config.cache_ttl = Duration::from_secs(secs);
        }
    }
    if let Ok(days) = env::var("LOG_RETENTION_DAYS") {
        config.log_retention = days
            .parse::<u64>()
            .ok()
            .map(|days| Duration::from_secs(days * 24 * 3600));
    }
    if let Ok(key) = env::var("SHARED_KEY") {
        config.shared_key = Some(key);
    }
    if let Ok(issuer) = env::var("TOTP_ISSUER") {
        config.totp_issuer = issuer;
    }
    if let Ok(pepper) = env::var("PASSWORD_PEPPER") {
        config.password_pepper = Some(pepper.into_bytes());
    }
    if let Ok(url) = env::var("OTP_RELAY_URL") {
        config.otp_relay_url = Some(url);
    }
    if let (Ok(email), Ok(password)) = (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
        config.initial_admin = Some(InitialAdmin { email, password });
    }

    // Debug surfaces exist only in debug builds, and even there must be
    // asked for explicitly.
    config.dev_expose_totp_debug =
        cfg!(debug_assertions) && env::var("DEV_EXPOSE_TOTP_DEBUG").as_deref() == Ok("1");

    config
}
