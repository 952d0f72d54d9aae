//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`torget_core::Error`] so that route
//! handlers can return `Result<T, AppError>` directly. Server errors are
//! logged with full detail but reported to the caller with a generic
//! message, so storage paths and driver messages never leave the process.
//! Request correlation happens via the `x-request-id` response header and
//! the per-request tracing span, not the body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError(torget_core::Error);

impl From<torget_core::Error> for AppError {
    fn from(e: torget_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let code = match &self.0 {
            torget_core::Error::NotFound { .. } => "not_found",
            torget_core::Error::Unauthorized(_) => "unauthorized",
            torget_core::Error::Forbidden(_) => "forbidden",
            torget_core::Error::Validation(_) => "validation_error",
            torget_core::Error::Conflict(_) => "conflict",
            torget_core::Error::Database { .. } => "database_error",
            torget_core::Error::Storage { .. } => "storage_error",
            torget_core::Error::Decode(_) => "decode_error",
            torget_core::Error::Io { .. } => "io_error",
            torget_core::Error::Internal(_) => "internal_error",
        };

        // 5xx detail stays in the logs; the response body is generic. The
        // enclosing request span carries the request id.
        let message = if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.0,
                "Server error in API handler"
            );
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_produces_404() {
        let err = AppError::from(torget_core::Error::not_found("listing", "abc"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_produces_409() {
        let err = AppError::from(torget_core::Error::Conflict("already sold".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_produces_500() {
        let err = AppError::from(torget_core::Error::storage("/secret/path: disk full"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
