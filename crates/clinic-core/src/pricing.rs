//! # Sale Pricing Calculator
//!
//! Given the chosen line items, a flat discount, an entry-payment fraction,
//! a payment method and an installment count, derives every monetary figure
//! needed to persist a sale and drive the receipt/commission record.
//!
//! ## Derivation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  lines ──► gross = Σ unit_price × qty                               │
//! │        └─► cost  = Σ unit_cost  × qty                               │
//! │                                                                     │
//! │  discount (clamped to [0, gross])                                   │
//! │        └─► final = gross − discount        (never negative)         │
//! │        └─► discount_bps = discount / gross (0 when gross = 0)       │
//! │                                                                     │
//! │  entry_bps (credit only)                                            │
//! │        └─► entry = final × entry_bps                                │
//! │        └─► principal = final − entry       (never negative)         │
//! │        └─► installment = principal / count (+ explicit remainder)   │
//! │                                                                     │
//! │  margins:  margin = gross − cost,  margin_final = final − cost      │
//! │  combo:    counts per bucket ──► tier decision table                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure function of its inputs, no hidden state, no I/O. Every percentage
//! with a zero denominator yields zero; the calculator never divides by
//! zero and never produces a negative final price or principal.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::category::TherapeuticCategory;
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::tier::{classify, ComboCounts, ComboTier};
use crate::MAX_ENTRY_BPS;

// =============================================================================
// Quote Input
// =============================================================================

/// One chosen line item, already joined against catalog and lot data.
///
/// The caller (checkout flow) resolves lot references to prices and costs;
/// the calculator itself never looks anything up.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteLine {
    /// Unit sale price from the SKU, in cents.
    pub unit_price_cents: i64,
    /// Unit cost from the lot, in cents.
    pub unit_cost_cents: i64,
    pub quantity: i64,
    pub category: TherapeuticCategory,
}

impl QuoteLine {
    fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    fn line_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale Quote
// =============================================================================

/// Every derived figure for one sale, in cents and basis points.
///
/// ## Invariants
/// - `final_price = max(0, gross − discount)`
/// - `entry + installment_principal == final_price`, exactly
/// - `installment × count + installment_remainder == principal`,
///   `remainder ≥ 0` (the front end folds the remainder into the first
///   installment when printing the payment plan)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleQuote {
    pub gross: Money,
    pub cost: Money,
    /// Discount actually applied (input clamped to `[0, gross]`).
    pub discount: Money,
    pub final_price: Money,
    pub discount_bps: i64,
    pub entry: Money,
    pub installment_principal: Money,
    pub installment_count: i64,
    pub installment: Money,
    /// Cents left over by the integer installment split.
    pub installment_remainder: Money,
    pub margin: Money,
    pub margin_bps: i64,
    pub margin_final: Money,
    pub margin_final_bps: i64,
    pub combo_tier: Option<ComboTier>,
}

impl SaleQuote {
    /// Derives all monetary figures for a sale.
    ///
    /// ## Arguments
    /// * `lines` - non-empty, quantities positive
    /// * `discount` - flat amount; values above gross are clamped
    /// * `entry_bps` - entry-payment fraction in `[0, 10000]`; ignored
    ///   (forced to 0) unless the payment method supports installments
    /// * `supports_installments` - whether the chosen payment method is the
    ///   installment-capable one (see `PaymentMethod::supports_installments`)
    /// * `installment_count` - ≥ 1; forced to 1 for non-installment methods
    ///
    /// ## Example
    /// ```rust
    /// use clinic_core::category::TherapeuticCategory;
    /// use clinic_core::money::Money;
    /// use clinic_core::pricing::{QuoteLine, SaleQuote};
    ///
    /// let lines = vec![QuoteLine {
    ///     unit_price_cents: 10000,
    ///     unit_cost_cents: 4000,
    ///     quantity: 2,
    ///     category: TherapeuticCategory::ToxinBotulinum,
    /// }];
    /// let quote = SaleQuote::compute(&lines, Money::from_cents(2000), 0, false, 1).unwrap();
    /// assert_eq!(quote.final_price.cents(), 18000);
    /// ```
    pub fn compute(
        lines: &[QuoteLine],
        discount: Money,
        entry_bps: u32,
        supports_installments: bool,
        installment_count: i64,
    ) -> CoreResult<SaleQuote> {
        if lines.is_empty() {
            return Err(crate::error::CoreError::EmptySale);
        }
        for line in lines {
            if line.quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }
        }
        if discount.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "discount".to_string(),
            }
            .into());
        }
        if entry_bps > MAX_ENTRY_BPS {
            return Err(ValidationError::OutOfRange {
                field: "entry".to_string(),
                min: 0,
                max: MAX_ENTRY_BPS as i64,
            }
            .into());
        }
        if installment_count < 1 {
            return Err(ValidationError::MustBePositive {
                field: "installment count".to_string(),
            }
            .into());
        }

        // Entry fraction and installment count only mean anything for the
        // installment-capable payment method
        let entry_bps = if supports_installments { entry_bps } else { 0 };
        let installment_count = if supports_installments { installment_count } else { 1 };

        let gross: Money = lines.iter().fold(Money::zero(), |acc, l| acc + l.line_total());
        let cost: Money = lines.iter().fold(Money::zero(), |acc, l| acc + l.line_cost());

        let discount = discount.min(gross);
        let final_price = gross.saturating_sub_zero(discount);
        let discount_bps = discount.ratio_bps(gross);

        let entry = final_price.apply_rate(entry_bps);
        let installment_principal = final_price.saturating_sub_zero(entry);
        let installment = Money::from_cents(installment_principal.cents() / installment_count);
        let installment_remainder =
            installment_principal - installment.multiply_quantity(installment_count);

        let margin = gross - cost;
        let margin_bps = margin.ratio_bps(gross);
        let margin_final = final_price - cost;
        let margin_final_bps = margin_final.ratio_bps(final_price);

        let counts = ComboCounts::tally(
            lines
                .iter()
                .map(|l| (l.category.combo_bucket(), l.quantity)),
        );

        Ok(SaleQuote {
            gross,
            cost,
            discount,
            final_price,
            discount_bps,
            entry,
            installment_principal,
            installment_count,
            installment,
            installment_remainder,
            margin,
            margin_bps,
            margin_final,
            margin_final_bps,
            combo_tier: classify(counts),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, cost: i64, qty: i64, category: TherapeuticCategory) -> QuoteLine {
        QuoteLine {
            unit_price_cents: price,
            unit_cost_cents: cost,
            quantity: qty,
            category,
        }
    }

    /// The reference scenario: three items at R$100×2, R$50×1, R$200×1,
    /// R$45 discount, 30% entry, 3 installments on credit.
    fn reference_lines() -> Vec<QuoteLine> {
        vec![
            line(10000, 4000, 2, TherapeuticCategory::ToxinBotulinum),
            line(5000, 2000, 1, TherapeuticCategory::HyaluronicFiller),
            line(20000, 9000, 1, TherapeuticCategory::Biostimulator),
        ]
    }

    #[test]
    fn test_reference_scenario() {
        let quote =
            SaleQuote::compute(&reference_lines(), Money::from_cents(4500), 3000, true, 3).unwrap();

        assert_eq!(quote.gross.cents(), 45000); // R$450.00
        assert_eq!(quote.final_price.cents(), 40500); // R$405.00
        assert_eq!(quote.discount_bps, 1000); // 10%
        assert_eq!(quote.entry.cents(), 12150); // R$121.50
        assert_eq!(quote.installment_principal.cents(), 28350); // R$283.50
        assert_eq!(quote.installment.cents(), 9450); // R$94.50
        assert_eq!(quote.installment_remainder.cents(), 0);
    }

    #[test]
    fn test_discount_clamp() {
        let lines = vec![line(10000, 5000, 1, TherapeuticCategory::Other)];

        // discount ≤ gross: exact subtraction
        let quote = SaleQuote::compute(&lines, Money::from_cents(2500), 0, false, 1).unwrap();
        assert_eq!(quote.final_price.cents(), 7500);

        // discount > gross: final price clamps to zero
        let quote = SaleQuote::compute(&lines, Money::from_cents(99999), 0, false, 1).unwrap();
        assert_eq!(quote.final_price.cents(), 0);
        assert_eq!(quote.discount.cents(), 10000); // clamped to gross
        assert_eq!(quote.discount_bps, 10000); // 100%
    }

    #[test]
    fn test_zero_gross_guards() {
        // Free items: gross is zero, every ratio must come back zero
        let lines = vec![line(0, 0, 1, TherapeuticCategory::Other)];
        let quote = SaleQuote::compute(&lines, Money::from_cents(500), 0, false, 1).unwrap();

        assert_eq!(quote.gross.cents(), 0);
        assert_eq!(quote.discount_bps, 0);
        assert_eq!(quote.margin_bps, 0);
        assert_eq!(quote.margin_final_bps, 0);
        assert_eq!(quote.final_price.cents(), 0);
    }

    #[test]
    fn test_entry_plus_principal_equals_final() {
        for entry_bps in [0u32, 1, 999, 3000, 5000, 9999, 10000] {
            let quote =
                SaleQuote::compute(&reference_lines(), Money::from_cents(4500), entry_bps, true, 3)
                    .unwrap();
            assert_eq!(
                (quote.entry + quote.installment_principal).cents(),
                quote.final_price.cents(),
                "entry_bps={}",
                entry_bps
            );
        }
    }

    #[test]
    fn test_installment_split_identity() {
        // A principal that does not divide evenly: remainder stays explicit
        let lines = vec![line(10001, 0, 1, TherapeuticCategory::Other)];
        let quote = SaleQuote::compute(&lines, Money::zero(), 0, true, 3).unwrap();

        assert_eq!(quote.installment.cents(), 3333);
        assert_eq!(quote.installment_remainder.cents(), 2);
        assert_eq!(
            quote.installment.cents() * quote.installment_count + quote.installment_remainder.cents(),
            quote.installment_principal.cents()
        );
        assert!(!quote.installment_remainder.is_negative());
    }

    #[test]
    fn test_non_credit_forces_cash_terms() {
        // Entry fraction and installments are ignored off-credit
        let quote =
            SaleQuote::compute(&reference_lines(), Money::from_cents(4500), 3000, false, 6).unwrap();

        assert_eq!(quote.entry.cents(), 0);
        assert_eq!(quote.installment_count, 1);
        assert_eq!(quote.installment.cents(), quote.final_price.cents());
    }

    #[test]
    fn test_margins() {
        let quote = SaleQuote::compute(&reference_lines(), Money::from_cents(4500), 0, false, 1)
            .unwrap();

        // gross 45000, cost 4000×2 + 2000 + 9000 = 19000
        assert_eq!(quote.cost.cents(), 19000);
        assert_eq!(quote.margin.cents(), 26000);
        assert_eq!(quote.margin_bps, 26000 * 10000 / 45000);
        assert_eq!(quote.margin_final.cents(), 40500 - 19000);
        assert_eq!(quote.margin_final_bps, 21500 * 10000 / 40500);
    }

    #[test]
    fn test_combo_tier_from_lines() {
        // toxin=2, filler=5, specialty=2 → Master
        let lines = vec![
            line(10000, 4000, 2, TherapeuticCategory::ToxinBotulinum),
            line(5000, 2000, 5, TherapeuticCategory::HyaluronicFiller),
            line(20000, 9000, 2, TherapeuticCategory::Skinbooster),
        ];
        let quote = SaleQuote::compute(&lines, Money::zero(), 0, false, 1).unwrap();
        assert_eq!(quote.combo_tier, Some(ComboTier::Master));

        // A single "Other" product earns no tier
        let lines = vec![line(10000, 4000, 3, TherapeuticCategory::Other)];
        let quote = SaleQuote::compute(&lines, Money::zero(), 0, false, 1).unwrap();
        assert_eq!(quote.combo_tier, None);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(SaleQuote::compute(&[], Money::zero(), 0, false, 1).is_err());

        let lines = vec![line(10000, 4000, 0, TherapeuticCategory::Other)];
        assert!(SaleQuote::compute(&lines, Money::zero(), 0, false, 1).is_err());

        let lines = vec![line(10000, 4000, 1, TherapeuticCategory::Other)];
        assert!(SaleQuote::compute(&lines, Money::from_cents(-1), 0, false, 1).is_err());
        assert!(SaleQuote::compute(&lines, Money::zero(), 10001, true, 1).is_err());
        assert!(SaleQuote::compute(&lines, Money::zero(), 0, true, 0).is_err());
    }
}
