//! Route handlers for the HTTP API.

pub mod auth;
pub mod health;
pub mod listings;
pub mod photos;
