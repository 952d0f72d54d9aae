//! Authentication route handlers: login, logout, status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::SESSION_COOKIE;

/// Login request payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login/status response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Auth status response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthStatusResponse {
    pub auth_enabled: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(ctx): State<AppContext>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth_config = &ctx.config.auth;

    if !auth_config.enabled {
        return Ok((
            StatusCode::OK,
            Json(AuthResponse {
                success: true,
                message: "Auth disabled".into(),
                token: None,
            }),
        ));
    }

    let conn = torget_db::pool::get_conn(&ctx.db)?;

    // Look up user in the database.
    let user = match torget_db::queries::users::get_user_by_username(&conn, &payload.username)? {
        Some(u) => u,
        None => {
            // Fall back to config-based auth (single-user mode): first login
            // creates the user row with a bcrypt hash.
            match (&auth_config.username, &auth_config.password_hash) {
                (Some(expected_user), Some(expected_hash))
                    if payload.username == *expected_user
                        && config_password_matches(&payload.password, expected_hash) =>
                {
                    let hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
                        .map_err(|e| torget_core::Error::Internal(format!("bcrypt error: {e}")))?;
                    torget_db::queries::users::create_user(
                        &conn,
                        &payload.username,
                        &hash,
                        "admin",
                    )?
                }
                _ => {
                    return Err(
                        torget_core::Error::Unauthorized("Invalid credentials".into()).into(),
                    );
                }
            }
        }
    };

    // Verify password against stored bcrypt hash; non-bcrypt hashes fall
    // back to the config password for compatibility with seeded users.
    let password_valid = if user.password_hash.starts_with("$2") {
        bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false)
    } else {
        match &auth_config.password_hash {
            Some(expected) => config_password_matches(&payload.password, expected),
            None => false,
        }
    };

    if !password_valid {
        return Err(torget_core::Error::Unauthorized("Invalid credentials".into()).into());
    }

    // Seeded users carry a non-bcrypt placeholder hash; upgrade it on the
    // first successful login so later logins verify against bcrypt.
    if !user.password_hash.starts_with("$2") {
        let hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
            .map_err(|e| torget_core::Error::Internal(format!("bcrypt error: {e}")))?;
        torget_db::queries::users::update_password(&conn, user.id, &hash)?;
        tracing::info!(user = %user.username, "Upgraded stored password hash to bcrypt");
    }

    let token = uuid::Uuid::new_v4().to_string();
    let expires = Utc::now() + Duration::hours(ctx.config.auth.session_timeout_hours as i64);
    let expires_str = expires.to_rfc3339();

    torget_db::queries::auth::create_token(&conn, user.id, &token, &expires_str)?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            success: true,
            message: "Login successful".into(),
            token: Some(token),
        }),
    ))
}

/// POST /auth/logout
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out")
    )
)]
pub async fn logout(
    State(ctx): State<AppContext>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    // Try to find the token from the Authorization header or cookie.
    let token = extract_token(&headers);

    if let Some(token) = token {
        if let Ok(conn) = torget_db::pool::get_conn(&ctx.db) {
            let _ = torget_db::queries::auth::delete_token(&conn, &token);
        }
    }

    Ok(StatusCode::OK)
}

/// GET /auth/status
#[utoipa::path(
    get,
    path = "/auth/status",
    responses(
        (status = 200, description = "Auth status", body = AuthStatusResponse)
    )
)]
pub async fn auth_status(
    State(ctx): State<AppContext>,
    headers: axum::http::HeaderMap,
) -> Json<AuthStatusResponse> {
    let auth_config = &ctx.config.auth;

    if !auth_config.enabled {
        return Json(AuthStatusResponse {
            auth_enabled: false,
            authenticated: true,
            user_id: None,
            username: None,
        });
    }

    if let Some(token) = extract_token(&headers) {
        if let Some(ref api_key) = auth_config.api_key {
            if token == *api_key {
                return Json(AuthStatusResponse {
                    auth_enabled: true,
                    authenticated: true,
                    user_id: None,
                    username: None,
                });
            }
        }

        let now = Utc::now().to_rfc3339();
        if let Ok(conn) = torget_db::pool::get_conn(&ctx.db) {
            if let Ok(Some(tok)) = torget_db::queries::auth::get_token(&conn, &token, &now) {
                let user = torget_db::queries::users::get_user_by_id(&conn, tok.user_id)
                    .ok()
                    .flatten();
                return Json(AuthStatusResponse {
                    auth_enabled: true,
                    authenticated: true,
                    user_id: Some(tok.user_id.to_string()),
                    username: user.map(|u| u.username),
                });
            }
        }
    }

    Json(AuthStatusResponse {
        auth_enabled: true,
        authenticated: false,
        user_id: None,
        username: None,
    })
}

/// Check a submitted password against the configured credential, which is
/// either a bcrypt hash (from `torget hash-password`) or a plain string.
fn config_password_matches(password: &str, configured: &str) -> bool {
    if configured.starts_with("$2") {
        bcrypt::verify(password, configured).unwrap_or(false)
    } else {
        password == configured
    }
}

/// Extract a bearer token or session cookie from request headers.
fn extract_token(headers: &axum::http::HeaderMap) -> Option<String> {
    // Check Authorization header first.
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(token) = val.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    // Check cookie.
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(cookies_str) = cookie.to_str() {
            for part in cookies_str.split(';') {
                let part = part.trim();
                if let Some(value) = part.strip_prefix(&format!("{SESSION_COOKIE}=")) {
                    return Some(value.to_string());
                }
            }
        }
    }

    None
}
