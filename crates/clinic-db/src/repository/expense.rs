//! # Commission Expense Repository
//!
//! Derived variable costs. One row per commissioned sale, created inside
//! the checkout transaction; this repository only reads them back by
//! accounting period.

use sqlx::{Sqlite, SqlitePool};

use crate::error::DbResult;
use clinic_core::CommissionExpense;

/// Repository for commission expense operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Commission the checkout derived for a sale, if any.
    pub async fn get_for_sale(
        &self,
        tenant_id: &str,
        sale_id: &str,
    ) -> DbResult<Option<CommissionExpense>> {
        let expense = sqlx::query_as::<_, CommissionExpense>(
            r#"
            SELECT id, tenant_id, sale_id, professional_id, description,
                   amount_cents, period_month, period_year, created_at
            FROM commission_expenses
            WHERE tenant_id = ?1 AND sale_id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Commissions accrued in an accounting month, newest first.
    pub async fn list_for_period(
        &self,
        tenant_id: &str,
        month: u32,
        year: i32,
    ) -> DbResult<Vec<CommissionExpense>> {
        let expenses = sqlx::query_as::<_, CommissionExpense>(
            r#"
            SELECT id, tenant_id, sale_id, professional_id, description,
                   amount_cents, period_month, period_year, created_at
            FROM commission_expenses
            WHERE tenant_id = ?1 AND period_month = ?2 AND period_year = ?3
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(month)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Total commission payable for an accounting month, in cents.
    pub async fn total_for_period(
        &self,
        tenant_id: &str,
        month: u32,
        year: i32,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM commission_expenses
            WHERE tenant_id = ?1 AND period_month = ?2 AND period_year = ?3
            "#,
        )
        .bind(tenant_id)
        .bind(month)
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

/// Inserts a commission expense. Checkout-transaction only.
pub async fn insert_commission_with<'e, E>(
    executor: E,
    expense: &CommissionExpense,
) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO commission_expenses (
            id, tenant_id, sale_id, professional_id, description,
            amount_cents, period_month, period_year, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&expense.id)
    .bind(&expense.tenant_id)
    .bind(&expense.sale_id)
    .bind(&expense.professional_id)
    .bind(&expense.description)
    .bind(expense.amount_cents)
    .bind(expense.period_month)
    .bind(expense.period_year)
    .bind(expense.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::checkout::{CheckoutLine, CheckoutRequest};
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use chrono::{NaiveDate, Utc};
    use clinic_core::{
        Patient, PaymentMethod, Product, Professional, ProfessionalProfile, StockLot,
    };

    const TENANT: &str = "clinic-1";

    /// Three commissioned sales: two in August 2026, one in September.
    /// Each sale is 1× R$100 with a 10% commission, so R$10.00 per sale.
    async fn db_with_commissions() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        let patient = Patient {
            id: generate_id(),
            tenant_id: TENANT.to_string(),
            name: "Maria Souza".to_string(),
            phone: None,
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.patients().insert(&patient).await.unwrap();

        let professional = Professional {
            id: generate_id(),
            tenant_id: TENANT.to_string(),
            name: "Dra. Beatriz".to_string(),
            profile: ProfessionalProfile::CommissionBased,
            commission_rate_bps: 1000,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.professionals().insert(&professional).await.unwrap();

        let product = Product {
            id: generate_id(),
            tenant_id: TENANT.to_string(),
            name: "Botox 100U".to_string(),
            category_label: "Toxina Botulinica".to_string(),
            list_price_cents: 10000,
            stock_minimum: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();

        let lot = StockLot {
            id: generate_id(),
            tenant_id: TENANT.to_string(),
            product_id: product.id.clone(),
            lot_code: "LOT-1".to_string(),
            quantity: 10,
            unit_cost_cents: 4000,
            expiry_date: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
            created_at: now,
            updated_at: now,
        };
        db.lots().insert(&lot).await.unwrap();

        let dates = [
            NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
            NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        ];
        for (idx, date) in dates.iter().enumerate() {
            db.checkout()
                .execute(
                    TENANT,
                    CheckoutRequest {
                        client_reference: format!("ref-{idx}"),
                        patient_id: patient.id.clone(),
                        professional_id: Some(professional.id.clone()),
                        sale_date: *date,
                        payment_method: PaymentMethod::Pix,
                        entry_bps: 0,
                        installment_count: 1,
                        discount_cents: 0,
                        lines: vec![CheckoutLine {
                            lot_id: lot.id.clone(),
                            quantity: 1,
                        }],
                    },
                )
                .await
                .unwrap();
        }

        db
    }

    #[tokio::test]
    async fn test_list_for_period_filters_by_accounting_month() {
        let db = db_with_commissions().await;

        let august = db.expenses().list_for_period(TENANT, 8, 2026).await.unwrap();
        assert_eq!(august.len(), 2);
        assert!(august.iter().all(|e| e.period_month == 8 && e.period_year == 2026));
        assert!(august.iter().all(|e| e.amount_cents == 1000));

        let september = db.expenses().list_for_period(TENANT, 9, 2026).await.unwrap();
        assert_eq!(september.len(), 1);

        assert!(db
            .expenses()
            .list_for_period(TENANT, 7, 2026)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_total_for_period_sums_the_month() {
        let db = db_with_commissions().await;

        // Two August commissions of R$10.00 each
        let total = db.expenses().total_for_period(TENANT, 8, 2026).await.unwrap();
        assert_eq!(total, 2000);

        // Empty periods and foreign tenants total zero, not an error
        let empty = db.expenses().total_for_period(TENANT, 7, 2026).await.unwrap();
        assert_eq!(empty, 0);

        let other_tenant = db.expenses().total_for_period("t2", 8, 2026).await.unwrap();
        assert_eq!(other_tenant, 0);
    }
}
