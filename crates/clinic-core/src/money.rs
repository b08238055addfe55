//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In JavaScript/floating point:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Cents                                        │
//! │    R$405.00 × 30% entry = 12150 cents, exactly                      │
//! │    40500 − 12150 = 28350 cents of principal, exactly                │
//! │                                                                     │
//! │  Installment splits that don't divide evenly keep an explicit       │
//! │  remainder instead of silently drifting.                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Percentages are carried in basis points (1 bps = 0.01%, 10000 = 100%),
//! so a 10% discount is 1000 bps and a 30% entry payment is 3000 bps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for margins on loss-making sales
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use clinic_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(10000); // R$100.00
    /// let line_total = unit_price.multiply_quantity(2);
    /// assert_eq!(line_total.cents(), 20000); // R$200.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a rate given in basis points, with half-up rounding.
    ///
    /// Used for the entry payment (`final × entry_bps`) and the commission
    /// (`final × rate_bps`).
    ///
    /// ## Implementation
    /// Integer math: `(amount × bps + 5000) / 10000`. The `+5000` rounds the
    /// half-cent up. i128 intermediate prevents overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use clinic_core::money::Money;
    ///
    /// let final_price = Money::from_cents(40500); // R$405.00
    /// let entry = final_price.apply_rate(3000);   // 30%
    /// assert_eq!(entry.cents(), 12150);           // R$121.50
    /// ```
    pub fn apply_rate(&self, bps: u32) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Expresses `self` as a share of `whole`, in basis points.
    ///
    /// A zero denominator yields zero, never an error: a fully discounted or
    /// empty sale simply has a 0% share. This is the single division-by-zero
    /// guard every percentage in the sale summary flows through.
    ///
    /// ## Example
    /// ```rust
    /// use clinic_core::money::Money;
    ///
    /// let discount = Money::from_cents(4500);
    /// let gross = Money::from_cents(45000);
    /// assert_eq!(discount.ratio_bps(gross), 1000); // 10%
    /// assert_eq!(discount.ratio_bps(Money::zero()), 0);
    /// ```
    pub fn ratio_bps(&self, whole: Money) -> i64 {
        if whole.0 == 0 {
            return 0;
        }
        ((self.0 as i128 * 10000) / whole.0 as i128) as i64
    }

    /// Subtracts `other`, clamping the result at zero.
    ///
    /// Used for the final price (`gross − discount`) and the installment
    /// principal (`final − entry`), which are never allowed to go negative.
    #[inline]
    pub const fn saturating_sub_zero(&self, other: Money) -> Money {
        let diff = self.0 - other.0;
        if diff < 0 {
            Money(0)
        } else {
            Money(diff)
        }
    }

    /// Returns the smaller of two values.
    #[inline]
    pub const fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For debugging. The web front end formats for locale itself.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}R${}.{:02}",
            sign,
            (self.0 / 100).abs(),
            (self.0 % 100).abs()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
