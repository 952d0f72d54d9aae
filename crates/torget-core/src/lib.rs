//! torget-core: shared types, IDs, errors, configuration, and price handling.
//!
//! This crate is the foundational dependency for all other torget crates,
//! providing type-safe identifiers, a unified error type, application
//! configuration, and fixed-point price parsing.

pub mod config;
pub mod error;
pub mod ids;
pub mod price;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
