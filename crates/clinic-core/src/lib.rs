//! # clinic-core: Pure Business Logic for Clinic Manager
//!
//! This crate is the **heart** of Clinic Manager. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Clinic Manager Architecture                      │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                  Web Front End (TypeScript)                   │  │
//! │  │   Catalog ──► New Sale modal ──► Summary ──► Dashboards       │  │
//! │  └─────────────────────────────┬─────────────────────────────────┘  │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐  │
//! │  │               ★ clinic-core (THIS CRATE) ★                    │  │
//! │  │                                                               │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────┐ ┌───────────┐  │  │
//! │  │  │  types  │ │  money  │ │ pricing  │ │ tier │ │ category  │  │  │
//! │  │  │ Sale    │ │ Money   │ │ SaleQuote│ │Combo │ │ normalize │  │  │
//! │  │  │ StockLot│ │ bps math│ │ derive   │ │table │ │ keywords  │  │  │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └──────┘ └───────────┘  │  │
//! │  │                                                               │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │  │
//! │  └─────────────────────────────┬─────────────────────────────────┘  │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐  │
//! │  │                  clinic-db (Database Layer)                   │  │
//! │  │        SQLite repositories, checkout transaction              │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, StockLot, Professional, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Sale composition and pricing calculator
//! - [`category`] - Free-text category label normalizer
//! - [`tier`] - Combo tier decision table
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64), all
//!    percentages in basis points - no float drift, no NaN
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod category;
pub mod error;
pub mod money;
pub mod pricing;
pub mod tier;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use category::{ComboBucket, TherapeuticCategory};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{QuoteLine, SaleQuote};
pub use tier::{classify, ComboCounts, ComboTier};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items in a single sale.
///
/// ## Business Reason
/// Prevents runaway carts; a clinic sale is a handful of procedures.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g. typing 100 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Entry-payment fraction upper bound: 10000 bps = 100%.
pub const MAX_ENTRY_BPS: u32 = 10_000;

/// Maximum installment count offered at checkout.
pub const MAX_INSTALLMENT_COUNT: i64 = 24;
