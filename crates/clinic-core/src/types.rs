//! # Domain Types
//!
//! Core domain types used throughout Clinic Manager.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌──────────────┐   ┌──────────────┐   ┌───────────────────┐        │
//! │  │   Product    │   │   StockLot   │   │       Sale        │        │
//! │  │ ──────────── │   │ ──────────── │   │ ───────────────── │        │
//! │  │ id (UUID)    │◄──│ product_id   │◄──│ SaleLine.lot_id   │        │
//! │  │ category     │   │ quantity     │   │ derived totals    │        │
//! │  │ list_price   │   │ unit_cost    │   │ combo_tier        │        │
//! │  │ stock_min    │   │ expiry_date  │   │ client_reference  │        │
//! │  └──────────────┘   └──────────────┘   └───────────────────┘        │
//! │                                                                     │
//! │  ┌──────────────┐   ┌──────────────┐   ┌───────────────────┐        │
//! │  │   Patient    │   │ Professional │   │ CommissionExpense │        │
//! │  └──────────────┘   │ profile+rate │──►│ period mm/yyyy    │        │
//! │                     └──────────────┘   └───────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key where one exists (lot_code, client_reference)
//!
//! Every aggregate root carries an explicit `tenant_id`. There is no
//! ambient "current tenant" anywhere in this workspace: callers pass the
//! tenant down, repositories filter on it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::category::TherapeuticCategory;
use crate::money::Money;
use crate::tier::ComboTier;

// =============================================================================
// Payment Method
// =============================================================================

/// How the patient pays at checkout.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Instant bank transfer.
    Pix,
    /// Debit card.
    Debit,
    /// Credit card - the only method that supports an entry payment
    /// plus installments.
    Credit,
}

impl PaymentMethod {
    /// True for the installment-capable method.
    ///
    /// Entry fraction and installment count are only meaningful here;
    /// for the other methods the calculator forces entry to 0 and the
    /// installment count to 1.
    pub const fn supports_installments(&self) -> bool {
        matches!(self, PaymentMethod::Credit)
    }
}

// =============================================================================
// Professional
// =============================================================================

/// Pay profile of a staff member.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProfessionalProfile {
    /// Fixed-stake owner; never generates commission expenses.
    Owner,
    /// Paid a percentage of the sales they are responsible for.
    CommissionBased,
}

/// A staff member who may be the sale's responsible party.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Professional {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub profile: ProfessionalProfile,
    /// Commission rate in basis points (1500 = 15%). Zero for owners.
    pub commission_rate_bps: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Professional {
    /// The commission this professional earns on a sale's final price.
    ///
    /// `Some` if and only if the profile is commission-based AND the rate
    /// is positive; owners and zero-rate professionals produce no expense
    /// record at all.
    pub fn commission_on(&self, final_price: Money) -> Option<Money> {
        if self.profile == ProfessionalProfile::CommissionBased && self.commission_rate_bps > 0 {
            Some(final_price.apply_rate(self.commission_rate_bps as u32))
        } else {
            None
        }
    }
}

// =============================================================================
// Patient
// =============================================================================

/// A clinic patient. Kept lean: the sale flow only needs identity.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Patient {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product (SKU)
// =============================================================================

/// A catalog entry. Read-only from the sale flow's perspective: the sale
/// borrows the list price from here, the unit cost from the lot.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    /// Display name shown in the catalog and on the sale summary.
    pub name: String,
    /// Free-text category label as typed by the clinic. Normalized via
    /// [`TherapeuticCategory::normalize`] wherever a canonical value is
    /// needed; the raw label is what the tenant sees and edits.
    pub category_label: String,
    /// List price in cents.
    pub list_price_cents: i64,
    /// Restock alert threshold, summed across the product's lots.
    pub stock_minimum: i64,
    /// Whether product is active (soft delete).
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the list price as a Money type.
    #[inline]
    pub fn list_price(&self) -> Money {
        Money::from_cents(self.list_price_cents)
    }

    /// Canonical therapeutic category for this product.
    #[inline]
    pub fn category(&self) -> TherapeuticCategory {
        TherapeuticCategory::normalize(&self.category_label)
    }
}

// =============================================================================
// Stock Lot
// =============================================================================

/// A batch of a product with its own remaining quantity, expiry date and
/// unit cost. Decremented when a sale consumes it; the quantity is never
/// allowed to go negative (checked client-side before submission, enforced
/// again by the guarded debit at persistence time).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockLot {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    /// Business identifier printed on the physical batch.
    pub lot_code: String,
    /// Remaining units.
    pub quantity: i64,
    /// Acquisition cost per unit, in cents.
    pub unit_cost_cents: i64,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockLot {
    /// Returns the unit cost as Money.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// Whether the lot is expired as of the given date.
    #[inline]
    pub fn is_expired(&self, on: NaiveDate) -> bool {
        self.expiry_date < on
    }

    /// Whether the lot still has `quantity` units available.
    #[inline]
    pub fn can_consume(&self, quantity: i64) -> bool {
        quantity > 0 && self.quantity >= quantity
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a stock movement.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Restock / initial stock.
    In,
    /// Consumed by a sale.
    Out,
    /// Manual correction.
    Adjustment,
}

/// Audit record appended for every change to a lot's quantity.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub tenant_id: String,
    pub lot_id: String,
    pub kind: MovementKind,
    /// Units moved, always positive; `kind` carries the direction.
    pub quantity: i64,
    /// Sale that consumed the stock, for `Out` movements.
    pub sale_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed commercial transaction.
///
/// Created at checkout completion; immutable thereafter. All derived
/// monetary fields are computed once by the pricing calculator and frozen
/// here. The database is a record, not a spreadsheet.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    /// Idempotency token supplied by the client. Resubmitting the same
    /// checkout after a network error returns the already-created sale
    /// instead of debiting stock twice.
    pub client_reference: String,
    pub patient_id: String,
    pub professional_id: Option<String>,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub installment_count: i64,
    // ---- inputs, frozen ----
    pub discount_cents: i64,
    pub entry_bps: i64,
    // ---- derived, frozen ----
    pub gross_cents: i64,
    pub cost_cents: i64,
    pub final_cents: i64,
    pub discount_bps: i64,
    pub entry_cents: i64,
    pub installment_cents: i64,
    pub margin_cents: i64,
    pub margin_bps: i64,
    pub margin_final_cents: i64,
    pub margin_final_bps: i64,
    pub combo_tier: Option<ComboTier>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the final price as Money.
    #[inline]
    pub fn final_price(&self) -> Money {
        Money::from_cents(self.final_cents)
    }
}

/// A line item in a sale: a reference to a stock lot and a quantity.
/// Uses snapshot pattern to freeze product and cost data at time of sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub lot_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Category label at time of sale (frozen).
    pub category_snapshot: String,
    /// Unit sale price in cents at time of sale (frozen, from the SKU).
    pub unit_price_cents: i64,
    /// Unit cost in cents at time of sale (frozen, from the lot).
    pub unit_cost_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Commission Expense
// =============================================================================

/// Derived variable-cost record produced when a commission-based
/// professional closes a sale. Tagged with the sale's month/year as its
/// accounting period so the finance dashboard can bucket it.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionExpense {
    pub id: String,
    pub tenant_id: String,
    pub sale_id: String,
    pub professional_id: String,
    pub description: String,
    /// `final_price × rate / 100`, in cents.
    pub amount_cents: i64,
    pub period_month: i64,
    pub period_year: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn professional(profile: ProfessionalProfile, rate_bps: i64) -> Professional {
        Professional {
            id: "p1".to_string(),
            tenant_id: "t1".to_string(),
            name: "Dra. Ana".to_string(),
            profile,
            commission_rate_bps: rate_bps,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_commission_iff_commission_based_and_positive_rate() {
        let final_price = Money::from_cents(40500);

        // Commission-based with 15% rate: R$60.75
        let commissioned = professional(ProfessionalProfile::CommissionBased, 1500);
        assert_eq!(commissioned.commission_on(final_price), Some(Money::from_cents(6075)));

        // Owner profile: no expense, even with a rate on file
        let owner = professional(ProfessionalProfile::Owner, 1500);
        assert_eq!(owner.commission_on(final_price), None);

        // Commission-based but zero rate: no expense
        let zero_rate = professional(ProfessionalProfile::CommissionBased, 0);
        assert_eq!(zero_rate.commission_on(final_price), None);
    }

    #[test]
    fn test_payment_method_installment_capability() {
        assert!(PaymentMethod::Credit.supports_installments());
        assert!(!PaymentMethod::Pix.supports_installments());
        assert!(!PaymentMethod::Debit.supports_installments());
    }

    #[test]
    fn test_lot_expiry_and_consumption() {
        let lot = StockLot {
            id: "l1".to_string(),
            tenant_id: "t1".to_string(),
            product_id: "pr1".to_string(),
            lot_code: "TOX-2026-03".to_string(),
            quantity: 5,
            unit_cost_cents: 30000,
            expiry_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(!lot.is_expired(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()));
        assert!(lot.is_expired(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));

        assert!(lot.can_consume(5));
        assert!(!lot.can_consume(6));
        assert!(!lot.can_consume(0));
    }

    #[test]
    fn test_enum_wire_format_matches_db_values() {
        use serde_json::json;

        // The serde renames, the sqlx column encoding and the schema CHECK
        // constraints must all agree on these strings
        assert_eq!(json!(PaymentMethod::Pix), json!("pix"));
        assert_eq!(json!(PaymentMethod::Credit), json!("credit"));
        assert_eq!(
            json!(ProfessionalProfile::CommissionBased),
            json!("commission_based")
        );
        assert_eq!(json!(MovementKind::Adjustment), json!("adjustment"));
        assert_eq!(json!(ComboTier::Master), json!("master"));

        let parsed: PaymentMethod = serde_json::from_str("\"debit\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Debit);
    }

    #[test]
    fn test_money_serializes_as_plain_integer() {
        let serialized = serde_json::to_string(&Money::from_cents(40500)).unwrap();
        assert_eq!(serialized, "40500");

        let parsed: Money = serde_json::from_str("40500").unwrap();
        assert_eq!(parsed, Money::from_cents(40500));
    }

    #[test]
    fn test_product_category_normalization() {
        let product = Product {
            id: "pr1".to_string(),
            tenant_id: "t1".to_string(),
            name: "Botox 100U".to_string(),
            category_label: "Toxina Botulinica".to_string(),
            list_price_cents: 120000,
            stock_minimum: 2,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(product.category(), TherapeuticCategory::ToxinBotulinum);
    }
}
