//! # Sale Repository
//!
//! Read access to completed sales plus the insert statements the checkout
//! transaction runs. Sales are append-only: there is no update or delete
//! here, a recorded sale is a fact.

use sqlx::{Sqlite, SqlitePool};

use crate::error::DbResult;
use clinic_core::{Sale, SaleLine};

const SELECT_COLUMNS: &str = r#"
    SELECT id, tenant_id, client_reference, patient_id, professional_id,
           sale_date, payment_method, installment_count,
           discount_cents, entry_bps,
           gross_cents, cost_cents, final_cents, discount_bps, entry_cents,
           installment_cents, margin_cents, margin_bps,
           margin_final_cents, margin_final_bps, combo_tier, created_at
    FROM sales
"#;

/// Repository for sale read operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID, tenant-scoped.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_COLUMNS} WHERE id = ?1 AND tenant_id = ?2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets the line items of a sale.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT id, sale_id, lot_id, product_id, name_snapshot, category_snapshot,
                   unit_price_cents, unit_cost_cents, quantity, line_total_cents, created_at
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Looks a sale up by its client-supplied idempotency token.
    pub async fn find_by_client_reference(
        &self,
        tenant_id: &str,
        client_reference: &str,
    ) -> DbResult<Option<Sale>> {
        find_by_client_reference_with(&self.pool, tenant_id, client_reference).await
    }

    /// Lists sales within an accounting month, newest first.
    pub async fn list_for_period(
        &self,
        tenant_id: &str,
        month: u32,
        year: i32,
    ) -> DbResult<Vec<Sale>> {
        let period = format!("{year:04}-{month:02}");

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_COLUMNS} WHERE tenant_id = ?1 AND strftime('%Y-%m', sale_date) = ?2 ORDER BY sale_date DESC, created_at DESC"
        ))
        .bind(tenant_id)
        .bind(period)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}

/// Idempotency lookup on any executor.
pub async fn find_by_client_reference_with<'e, E>(
    executor: E,
    tenant_id: &str,
    client_reference: &str,
) -> DbResult<Option<Sale>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "{SELECT_COLUMNS} WHERE tenant_id = ?1 AND client_reference = ?2"
    ))
    .bind(tenant_id)
    .bind(client_reference)
    .fetch_optional(executor)
    .await?;

    Ok(sale)
}

/// Inserts the sale header. Checkout-transaction only.
pub async fn insert_sale_with<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, tenant_id, client_reference, patient_id, professional_id,
            sale_date, payment_method, installment_count,
            discount_cents, entry_bps,
            gross_cents, cost_cents, final_cents, discount_bps, entry_cents,
            installment_cents, margin_cents, margin_bps,
            margin_final_cents, margin_final_bps, combo_tier, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.tenant_id)
    .bind(&sale.client_reference)
    .bind(&sale.patient_id)
    .bind(&sale.professional_id)
    .bind(sale.sale_date)
    .bind(sale.payment_method)
    .bind(sale.installment_count)
    .bind(sale.discount_cents)
    .bind(sale.entry_bps)
    .bind(sale.gross_cents)
    .bind(sale.cost_cents)
    .bind(sale.final_cents)
    .bind(sale.discount_bps)
    .bind(sale.entry_cents)
    .bind(sale.installment_cents)
    .bind(sale.margin_cents)
    .bind(sale.margin_bps)
    .bind(sale.margin_final_cents)
    .bind(sale.margin_final_bps)
    .bind(sale.combo_tier)
    .bind(sale.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Inserts one sale line. Checkout-transaction only.
pub async fn insert_line_with<'e, E>(executor: E, line: &SaleLine) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO sale_lines (
            id, sale_id, lot_id, product_id, name_snapshot, category_snapshot,
            unit_price_cents, unit_cost_cents, quantity, line_total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.lot_id)
    .bind(&line.product_id)
    .bind(&line.name_snapshot)
    .bind(&line.category_snapshot)
    .bind(line.unit_price_cents)
    .bind(line.unit_cost_cents)
    .bind(line.quantity)
    .bind(line.line_total_cents)
    .bind(line.created_at)
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
    use clinic_core::{Patient, PaymentMethod, Product, StockLot};

    const TENANT: &str = "clinic-1";

    async fn db_with_sales_on(dates: &[NaiveDate]) -> Database {
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
            quantity: 50,
            unit_cost_cents: 4000,
            expiry_date: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
            created_at: now,
            updated_at: now,
        };
        db.lots().insert(&lot).await.unwrap();

        for (idx, date) in dates.iter().enumerate() {
            db.checkout()
                .execute(
                    TENANT,
                    CheckoutRequest {
                        client_reference: format!("ref-{idx}"),
                        patient_id: patient.id.clone(),
                        professional_id: None,
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
    async fn test_list_for_period_filters_by_month() {
        let db = db_with_sales_on(&[
            NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
            NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        ])
        .await;

        let august = db.sales().list_for_period(TENANT, 8, 2026).await.unwrap();
        assert_eq!(august.len(), 2);
        // Newest first
        assert!(august[0].sale_date >= august[1].sale_date);

        let september = db.sales().list_for_period(TENANT, 9, 2026).await.unwrap();
        assert_eq!(september.len(), 1);

        assert!(db
            .sales()
            .list_for_period("t2", 8, 2026)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id_and_client_reference_agree() {
        let db = db_with_sales_on(&[NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()]).await;

        let by_reference = db
            .sales()
            .find_by_client_reference(TENANT, "ref-0")
            .await
            .unwrap()
            .unwrap();
        let by_id = db
            .sales()
            .get_by_id(TENANT, &by_reference.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(by_id.client_reference, "ref-0");
        assert_eq!(by_id.final_cents, by_reference.final_cents);
    }
}
