//! Authentication middleware.
//!
//! Validates session cookies or API key bearer tokens. Browsing (listings,
//! photos, health, auth endpoints) is public; anything that changes
//! marketplace state requires a caller identity. When auth is disabled the
//! well-known anonymous [`UserId`] is injected instead, so
//! `Extension<UserId>` extractors keep working.

use axum::extract::State;
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use torget_core::UserId;
use torget_db::pool::DbPool;

use crate::context::AppContext;

/// Cookie name for browser sessions.
pub const SESSION_COOKIE: &str = "torget_session";

/// Well-known user ID for unauthenticated requests (auth disabled).
/// Seeded into the users table by the migrations.
const ANONYMOUS_USER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Whether a route changes marketplace state and therefore needs a caller
/// identity. Everything else is world-readable.
pub fn requires_auth(method: &Method, path: &str) -> bool {
    match *method {
        Method::POST => path == "/listings",
        Method::DELETE => path == "/listings",
        Method::PUT => path.starts_with("/listings/") && path.ends_with("/buy"),
        _ => false,
    }
}

/// Validate an auth token from raw HTTP header values.
///
/// Returns `Some(UserId)` on success, `None` on failure.
///
/// Token resolution order:
/// 1. `Authorization: Bearer <token>` (API clients)
/// 2. Cookie: `torget_session=<token>` (web browser)
pub fn validate_auth_headers(
    auth_config: &torget_core::config::AuthConfig,
    db: &DbPool,
    authorization: Option<&str>,
    cookie: Option<&str>,
) -> Option<UserId> {
    // If auth is not enabled, return anonymous user.
    if !auth_config.enabled {
        return ANONYMOUS_USER_ID.parse().ok();
    }

    // 1. Check Authorization: Bearer header.
    if let Some(auth_value) = authorization {
        if let Some(token) = auth_value.strip_prefix("Bearer ") {
            if let Some(uid) = validate_token(auth_config, db, token) {
                return Some(uid);
            }
        }
    }

    // 2. Check session cookie.
    if let Some(cookies_str) = cookie {
        for part in cookies_str.split(';') {
            let part = part.trim();
            if let Some(value) = part.strip_prefix(&format!("{SESSION_COOKIE}=")) {
                if let Some(uid) = validate_token(auth_config, db, value) {
                    return Some(uid);
                }
            }
        }
    }

    None
}

/// Validate a single token against the config API key and DB tokens.
fn validate_token(
    auth_config: &torget_core::config::AuthConfig,
    db: &DbPool,
    token: &str,
) -> Option<UserId> {
    // Check against config API key.
    if let Some(ref api_key) = auth_config.api_key {
        if token == *api_key {
            return ANONYMOUS_USER_ID.parse().ok();
        }
    }

    // Check against DB tokens, skipping any that have expired.
    let now = chrono::Utc::now().to_rfc3339();
    if let Ok(conn) = torget_db::pool::get_conn(db) {
        if let Ok(Some(tok)) = torget_db::queries::auth::get_token(&conn, token, &now) {
            return Some(tok.user_id);
        }
    }

    None
}

/// Authentication middleware, applied to the whole router.
///
/// On success, inserts the resolved [`UserId`] into request extensions.
/// Public routes pass through even without credentials; routes for which
/// [`requires_auth`] holds get a 401 instead.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let authorization = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    let cookie = request
        .headers()
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    let user_id = validate_auth_headers(
        &ctx.config.auth,
        &ctx.db,
        authorization.as_deref(),
        cookie.as_deref(),
    );

    match user_id {
        Some(user_id) => {
            request.extensions_mut().insert(user_id);
            Ok(next.run(request).await)
        }
        None if requires_auth(request.method(), request.uri().path()) => {
            Err((StatusCode::UNAUTHORIZED, "Authentication required").into_response())
        }
        None => Ok(next.run(request).await),
    }
}
