//! # Error Types
//!
//! Domain-specific error types for clinic-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  clinic-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  clinic-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                 │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → front end            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (lot code, quantities, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations surfaced to the user before or
/// during checkout.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout submitted with no line items selected.
    #[error("Sale must contain at least one item")]
    EmptySale,

    /// Checkout submitted with no patient selected.
    #[error("A patient must be selected before finishing the sale")]
    PatientRequired,

    /// Requested quantity exceeds what the lot has left.
    ///
    /// ## When This Occurs
    /// - Client-side, comparing the request against the last-read quantity
    /// - Server-side, when the guarded debit touches zero rows
    #[error("Insufficient stock in lot {lot_code}: available {available}, requested {requested}")]
    InsufficientStock {
        lot_code: String,
        available: i64,
        requested: i64,
    },

    /// The lot expired before the sale date.
    #[error("Lot {lot_code} expired on {expired_on}")]
    LotExpired {
        lot_code: String,
        expired_on: String,
    },

    /// A referenced entity disappeared between read and write.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements. Used for early
/// validation before business logic runs; they block submission without
/// touching the database.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
