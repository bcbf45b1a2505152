//! Auth Middleware
//!
//! Pre-shared application key gate. Every route behind this middleware
//! requires an `x-app-key` header whose base64-decoded value matches the
//! configured key under constant-time comparison. The gate is a pure
//! precondition: it touches neither the credential store nor the audit log.

use axum::Json;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use platform::crypto::{constant_time_eq, from_base64};

use crate::application::config::AuthConfig;

/// Header carrying the base64-encoded application key
pub const APP_KEY_HEADER: &str = "x-app-key";

/// Middleware that requires a valid pre-shared application key
pub async fn require_shared_key(
    axum::extract::State(config): axum::extract::State<Arc<AuthConfig>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let Some(encoded) = req
        .headers()
        .get(APP_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        return Err(gate_response(
            StatusCode::FORBIDDEN,
            "Forbidden: missing app key",
        ));
    };

    let Some(expected) = config.shared_key.as_deref() else {
        tracing::error!("Shared application key is not configured");
        return Err(gate_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error",
        ));
    };

    let decoded = match from_base64(encoded) {
        Ok(decoded) => decoded,
        Err(_) => {
            return Err(gate_response(
                StatusCode::BAD_REQUEST,
                "Invalid token format",
            ));
        }
    };

    if !constant_time_eq(&decoded, expected.as_bytes()) {
        return Err(gate_response(
            StatusCode::FORBIDDEN,
            "Forbidden: invalid app key",
        ));
    }

    Ok(next.run(req).await)
}

fn gate_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "message": message,
        })),
    )
        .into_response()
}
