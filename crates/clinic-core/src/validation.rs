//! # Validation Module
//!
//! Input validation utilities for Clinic Manager.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: Web front end (TypeScript)                                │
//! │  ├── Basic format checks, immediate feedback                       │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: THIS MODULE - business rule validation                    │
//! │  ├── Blocks submission before any query runs                       │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Database (SQLite)                                         │
//! │  ├── CHECK (quantity >= 0), UNIQUE, foreign keys                    │
//! │                                                                     │
//! │  Defense in depth: the guarded stock debit re-validates what the    │
//! │  client checked against a stale read.                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, ValidationError};
use crate::{MAX_ENTRY_BPS, MAX_INSTALLMENT_COUNT, MAX_LINE_QUANTITY, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (patient, professional, product).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a lot code (the batch identifier printed on the vial box).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only letters, numbers, hyphens, underscores
pub fn validate_lot_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "lot_code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "lot_code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "lot_code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost in cents. Zero is allowed (courtesy items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a flat discount in cents. Non-negative; the calculator clamps
/// anything above gross, so no upper bound here.
pub fn validate_discount_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an entry-payment fraction in basis points (0% to 100%).
pub fn validate_entry_bps(bps: u32) -> ValidationResult<()> {
    if bps > MAX_ENTRY_BPS {
        return Err(ValidationError::OutOfRange {
            field: "entry".to_string(),
            min: 0,
            max: MAX_ENTRY_BPS as i64,
        });
    }

    Ok(())
}

/// Validates an installment count.
pub fn validate_installment_count(count: i64) -> ValidationResult<()> {
    if count < 1 || count > MAX_INSTALLMENT_COUNT {
        return Err(ValidationError::OutOfRange {
            field: "installment count".to_string(),
            min: 1,
            max: MAX_INSTALLMENT_COUNT,
        });
    }

    Ok(())
}

/// Validates a commission rate in basis points (0% to 100%).
pub fn validate_commission_rate_bps(bps: i64) -> ValidationResult<()> {
    if !(0..=10000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "commission rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Checkout Validator
// =============================================================================

/// Pre-flight validation for the whole checkout request: runs before any
/// network call and simply blocks submission on failure.
///
/// ## Checks
/// - A patient is selected
/// - At least one line item is selected, at most MAX_SALE_LINES
/// - Every quantity is positive and within bounds
///
/// Per-lot availability is checked separately against lot data
/// (`CoreError::InsufficientStock`) because it needs the current stock
/// figure; this function is for the purely local rules.
pub fn validate_checkout_request(
    patient_id: &str,
    line_quantities: &[i64],
) -> Result<(), CoreError> {
    if patient_id.trim().is_empty() {
        return Err(CoreError::PatientRequired);
    }

    if line_quantities.is_empty() {
        return Err(CoreError::EmptySale);
    }

    if line_quantities.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "line items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        }
        .into());
    }

    for &qty in line_quantities {
        validate_quantity(qty)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Maria Souza").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_lot_code() {
        assert!(validate_lot_code("TOX-2026-03").is_ok());
        assert!(validate_lot_code("L123_A").is_ok());
        assert!(validate_lot_code("").is_err());
        assert!(validate_lot_code("has space").is_err());
        assert!(validate_lot_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_entry_bps() {
        assert!(validate_entry_bps(0).is_ok());
        assert!(validate_entry_bps(3000).is_ok());
        assert!(validate_entry_bps(10000).is_ok());
        assert!(validate_entry_bps(10001).is_err());
    }

    #[test]
    fn test_validate_installment_count() {
        assert!(validate_installment_count(1).is_ok());
        assert!(validate_installment_count(12).is_ok());
        assert!(validate_installment_count(0).is_err());
        assert!(validate_installment_count(25).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_checkout_request() {
        assert!(validate_checkout_request("patient-1", &[1, 2]).is_ok());

        // No patient selected
        assert!(matches!(
            validate_checkout_request("", &[1]),
            Err(CoreError::PatientRequired)
        ));

        // No line items selected
        assert!(matches!(
            validate_checkout_request("patient-1", &[]),
            Err(CoreError::EmptySale)
        ));

        // Bad quantity
        assert!(validate_checkout_request("patient-1", &[1, 0]).is_err());
    }
}
