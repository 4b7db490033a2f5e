//! Error types shared across the proposal suite
//!
//! Crate-specific errors (CSV parse errors, render errors) live in their
//! own crates; only the domain-wide kinds are defined here.

use thiserror::Error;

/// Malformed financial input — a caller contract violation.
///
/// Fatal to the single computation it was raised from, not to the
/// caller's process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A numeric input was NaN or infinite
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// A value that must be non-negative was negative
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    /// A value beyond the supported upper bound (keeps Decimal
    /// arithmetic clear of overflow)
    #[error("{field} exceeds maximum allowed ({max}), got {value}")]
    ExceedsMax {
        field: &'static str,
        value: f64,
        max: f64,
    },

    /// Quantity must be strictly positive
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    /// Discount percentage outside 0..=100
    #[error("discount_percent must be between 0 and 100, got {0}")]
    InvalidDiscount(f64),

    /// A line item references a product code that was not supplied
    #[error("item references unknown product code '{0}'")]
    UnknownProduct(String),
}

/// Error surfaced from the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    /// Underlying store failure
    #[error("store error: {0}")]
    Store(String),

    /// Write conflict (e.g. duplicate natural key in one batch)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation cancelled cooperatively between batches
    #[error("operation cancelled")]
    Cancelled,
}
