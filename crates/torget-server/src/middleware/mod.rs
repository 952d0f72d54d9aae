//! HTTP middleware.

pub mod auth;
pub mod request_id;
