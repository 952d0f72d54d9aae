//! Database query modules.

pub mod auth;
pub mod listings;
pub mod photos;
pub mod users;
