//! # Checkout Flow
//!
//! Turns a validated cart into a recorded sale. Everything happens inside
//! one SQLite transaction:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                              │
//! │    1. idempotency: client_reference already recorded? → return it   │
//! │    2. load patient, professional, lots + products                   │
//! │    3. reject expired lots and short stock                           │
//! │    4. SaleQuote::compute → every derived figure                     │
//! │    5. INSERT sale, INSERT lines                                     │
//! │    6. per line: guarded debit + 'out' movement                      │
//! │    7. commission-based professional? INSERT commission expense      │
//! │  COMMIT    (any failure rolls the whole sale back)                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Idempotency
//! The client sends a `client_reference` token with every checkout. A
//! resubmission after a lost response finds the existing sale (step 1, or
//! the UNIQUE(tenant_id, client_reference) index if two submissions race)
//! and returns it without debiting stock a second time.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{expense, generate_id, lot, product, professional, sale};
use clinic_core::pricing::{QuoteLine, SaleQuote};
use clinic_core::validation::validate_checkout_request;
use clinic_core::{
    validation, CommissionExpense, CoreError, Money, MovementKind, PaymentMethod, Sale, SaleLine,
};

// =============================================================================
// Request / Outcome
// =============================================================================

/// One cart line: a lot reference and how many units to consume from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub lot_id: String,
    pub quantity: i64,
}

/// Everything the client submits to finish a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Client-generated idempotency token, unique per tenant.
    pub client_reference: String,
    pub patient_id: String,
    pub professional_id: Option<String>,
    pub sale_date: chrono::NaiveDate,
    pub payment_method: PaymentMethod,
    /// Entry-payment fraction in basis points; credit only.
    pub entry_bps: u32,
    pub installment_count: i64,
    /// Flat discount in cents.
    pub discount_cents: i64,
    pub lines: Vec<CheckoutLine>,
}

/// Result of a checkout call.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub sale: Sale,
    /// False when the sale was created by this call; true when the
    /// client_reference matched an already-recorded sale.
    pub already_recorded: bool,
}

// =============================================================================
// Checkout
// =============================================================================

/// The checkout flow. Spans several repositories inside one transaction,
/// so it owns the pool rather than borrowing a single repository.
#[derive(Debug, Clone)]
pub struct Checkout {
    pool: SqlitePool,
}

impl Checkout {
    /// Creates a new checkout flow over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Checkout { pool }
    }

    /// Records a sale, or returns the one already recorded under the same
    /// client_reference.
    pub async fn execute(
        &self,
        tenant_id: &str,
        request: CheckoutRequest,
    ) -> DbResult<CheckoutOutcome> {
        let quantities: Vec<i64> = request.lines.iter().map(|l| l.quantity).collect();
        validate_checkout_request(&request.patient_id, &quantities).map_err(DbError::Core)?;
        validation::validate_entry_bps(request.entry_bps)
            .map_err(|e| DbError::Core(e.into()))?;
        validation::validate_installment_count(request.installment_count)
            .map_err(|e| DbError::Core(e.into()))?;
        validation::validate_discount_cents(request.discount_cents)
            .map_err(|e| DbError::Core(e.into()))?;

        let mut tx = self.pool.begin().await?;

        // Step 1: idempotency. Inside the transaction so a racing duplicate
        // either shows up here or trips the UNIQUE index below.
        if let Some(existing) =
            sale::find_by_client_reference_with(&mut *tx, tenant_id, &request.client_reference)
                .await?
        {
            info!(
                sale_id = %existing.id,
                client_reference = %request.client_reference,
                "Checkout resubmission, returning recorded sale"
            );
            return Ok(CheckoutOutcome {
                sale: existing,
                already_recorded: true,
            });
        }

        // Step 2: resolve references
        let patient_exists: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM patients WHERE id = ?1 AND tenant_id = ?2")
                .bind(&request.patient_id)
                .bind(tenant_id)
                .fetch_one(&mut *tx)
                .await?;
        if patient_exists == 0 {
            return Err(DbError::not_found("Patient", &request.patient_id));
        }

        let responsible = match &request.professional_id {
            Some(id) => Some(
                professional::get_by_id_with(&mut *tx, tenant_id, id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Professional", id))?,
            ),
            None => None,
        };

        let mut resolved = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let stock_lot = lot::get_by_id_with(&mut *tx, tenant_id, &line.lot_id)
                .await?
                .ok_or_else(|| DbError::not_found("StockLot", &line.lot_id))?;

            // Step 3: expiry and availability against the in-transaction read
            if stock_lot.is_expired(request.sale_date) {
                return Err(DbError::Core(CoreError::LotExpired {
                    lot_code: stock_lot.lot_code,
                    expired_on: stock_lot.expiry_date.to_string(),
                }));
            }
            if !stock_lot.can_consume(line.quantity) {
                return Err(DbError::Core(CoreError::InsufficientStock {
                    lot_code: stock_lot.lot_code,
                    available: stock_lot.quantity,
                    requested: line.quantity,
                }));
            }

            let catalog_product =
                product::get_by_id_with(&mut *tx, tenant_id, &stock_lot.product_id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Product", &stock_lot.product_id))?;

            resolved.push((stock_lot, catalog_product, line.quantity));
        }

        // Step 4: derive every monetary figure
        let quote_lines: Vec<QuoteLine> = resolved
            .iter()
            .map(|(stock_lot, catalog_product, quantity)| QuoteLine {
                unit_price_cents: catalog_product.list_price_cents,
                unit_cost_cents: stock_lot.unit_cost_cents,
                quantity: *quantity,
                category: catalog_product.category(),
            })
            .collect();

        let quote = SaleQuote::compute(
            &quote_lines,
            Money::from_cents(request.discount_cents),
            request.entry_bps,
            request.payment_method.supports_installments(),
            request.installment_count,
        )
        .map_err(DbError::Core)?;

        // Step 5: sale header with the derived figures frozen in
        let now = Utc::now();
        let new_sale = Sale {
            id: generate_id(),
            tenant_id: tenant_id.to_string(),
            client_reference: request.client_reference.clone(),
            patient_id: request.patient_id.clone(),
            professional_id: request.professional_id.clone(),
            sale_date: request.sale_date,
            payment_method: request.payment_method,
            installment_count: quote.installment_count,
            discount_cents: quote.discount.cents(),
            entry_bps: if request.payment_method.supports_installments() {
                request.entry_bps as i64
            } else {
                0
            },
            gross_cents: quote.gross.cents(),
            cost_cents: quote.cost.cents(),
            final_cents: quote.final_price.cents(),
            discount_bps: quote.discount_bps,
            entry_cents: quote.entry.cents(),
            installment_cents: quote.installment.cents(),
            margin_cents: quote.margin.cents(),
            margin_bps: quote.margin_bps,
            margin_final_cents: quote.margin_final.cents(),
            margin_final_bps: quote.margin_final_bps,
            combo_tier: quote.combo_tier,
            created_at: now,
        };

        match sale::insert_sale_with(&mut *tx, &new_sale).await {
            Ok(()) => {}
            // Lost the race on UNIQUE(tenant_id, client_reference): the other
            // submission's sale is the sale
            Err(DbError::UniqueViolation { field, .. })
                if field.contains("client_reference") =>
            {
                drop(tx);
                warn!(
                    client_reference = %request.client_reference,
                    "Concurrent checkout resubmission"
                );
                let existing = sale::find_by_client_reference_with(
                    &self.pool,
                    tenant_id,
                    &request.client_reference,
                )
                .await?
                .ok_or_else(|| {
                    DbError::Internal("duplicate client_reference without a sale".to_string())
                })?;
                return Ok(CheckoutOutcome {
                    sale: existing,
                    already_recorded: true,
                });
            }
            Err(e) => return Err(e),
        }

        // Steps 5-6: lines, guarded debits, movement ledger
        for (stock_lot, catalog_product, quantity) in &resolved {
            let line = SaleLine {
                id: generate_id(),
                sale_id: new_sale.id.clone(),
                lot_id: stock_lot.id.clone(),
                product_id: catalog_product.id.clone(),
                name_snapshot: catalog_product.name.clone(),
                category_snapshot: catalog_product.category_label.clone(),
                unit_price_cents: catalog_product.list_price_cents,
                unit_cost_cents: stock_lot.unit_cost_cents,
                quantity: *quantity,
                line_total_cents: catalog_product.list_price_cents * quantity,
                created_at: now,
            };
            sale::insert_line_with(&mut *tx, &line).await?;

            lot::debit_with(&mut *tx, tenant_id, &stock_lot.id, *quantity).await?;
            lot::record_movement_with(
                &mut *tx,
                tenant_id,
                &stock_lot.id,
                MovementKind::Out,
                *quantity,
                Some(&new_sale.id),
            )
            .await?;
        }

        // Step 7: derived commission expense, commission-based profile only
        if let Some(professional) = &responsible {
            if let Some(amount) = professional.commission_on(quote.final_price) {
                let expense_record = CommissionExpense {
                    id: generate_id(),
                    tenant_id: tenant_id.to_string(),
                    sale_id: new_sale.id.clone(),
                    professional_id: professional.id.clone(),
                    description: format!("Commission - {}", professional.name),
                    amount_cents: amount.cents(),
                    period_month: request.sale_date.month() as i64,
                    period_year: request.sale_date.year() as i64,
                    created_at: now,
                };
                expense::insert_commission_with(&mut *tx, &expense_record).await?;
            }
        }

        tx.commit().await?;

        info!(
            sale_id = %new_sale.id,
            final_cents = new_sale.final_cents,
            combo_tier = ?new_sale.combo_tier,
            "Sale recorded"
        );

        Ok(CheckoutOutcome {
            sale: new_sale,
            already_recorded: false,
        })
    }
}

// =============================================================================
// Integration Tests
// =============================================================================
