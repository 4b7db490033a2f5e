//! Shared types for the proposal suite
//!
//! Domain models, error types, and locale/formatting configuration used
//! across the engine and document crates.

pub mod config;
pub mod error;
pub mod format;
pub mod models;

// Re-exports
pub use config::FormatConfig;
pub use error::{PersistenceError, ValidationError};
pub use serde::{Deserialize, Serialize};
