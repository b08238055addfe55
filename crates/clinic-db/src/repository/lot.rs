//! # Stock Lot Repository
//!
//! Database operations for stock lots and their movement ledger.
//!
//! ## Never-Negative Invariant
//! A lot's quantity must never go below zero. Every decrement goes through
//! [`debit_with`], a guarded UPDATE whose WHERE clause re-checks the
//! remaining quantity. If another transaction consumed the stock first,
//! zero rows are affected and the caller gets `InsufficientStock` instead
//! of a negative balance.
//!
//! Every quantity change also appends a [`StockMovement`] row, so the
//! ledger replays to the current balance.

use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use clinic_core::{CoreError, MovementKind, StockLot, StockMovement};

const SELECT_COLUMNS: &str = r#"
    SELECT id, tenant_id, product_id, lot_code, quantity, unit_cost_cents,
           expiry_date, created_at, updated_at
    FROM stock_lots
"#;

/// Repository for stock lot database operations.
#[derive(Debug, Clone)]
pub struct LotRepository {
    pool: SqlitePool,
}

impl LotRepository {
    /// Creates a new LotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LotRepository { pool }
    }

    /// Inserts a new lot and records its opening `In` movement.
    pub async fn insert(&self, lot: &StockLot) -> DbResult<()> {
        debug!(id = %lot.id, lot_code = %lot.lot_code, quantity = lot.quantity, "Inserting lot");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO stock_lots (
                id, tenant_id, product_id, lot_code, quantity, unit_cost_cents,
                expiry_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&lot.id)
        .bind(&lot.tenant_id)
        .bind(&lot.product_id)
        .bind(&lot.lot_code)
        .bind(lot.quantity)
        .bind(lot.unit_cost_cents)
        .bind(lot.expiry_date)
        .bind(lot.created_at)
        .bind(lot.updated_at)
        .execute(&mut *tx)
        .await?;

        if lot.quantity > 0 {
            record_movement_with(
                &mut *tx,
                &lot.tenant_id,
                &lot.id,
                MovementKind::In,
                lot.quantity,
                None,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a lot by ID, tenant-scoped.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<StockLot>> {
        get_by_id_with(&self.pool, tenant_id, id).await
    }

    /// Lists lots of a product, soonest expiry first.
    pub async fn list_for_product(
        &self,
        tenant_id: &str,
        product_id: &str,
    ) -> DbResult<Vec<StockLot>> {
        let lots = sqlx::query_as::<_, StockLot>(&format!(
            "{SELECT_COLUMNS} WHERE tenant_id = ?1 AND product_id = ?2 ORDER BY expiry_date, lot_code"
        ))
        .bind(tenant_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lots)
    }

    /// Lists lots with remaining stock that expire on or before the cutoff.
    ///
    /// Drives the expiry alert panel; empty lots are not worth alerting on.
    pub async fn list_expiring_before(
        &self,
        tenant_id: &str,
        cutoff: NaiveDate,
    ) -> DbResult<Vec<StockLot>> {
        let lots = sqlx::query_as::<_, StockLot>(&format!(
            "{SELECT_COLUMNS} WHERE tenant_id = ?1 AND expiry_date <= ?2 AND quantity > 0 ORDER BY expiry_date"
        ))
        .bind(tenant_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(lots)
    }

    /// Adds units to a lot and records an `In` movement.
    pub async fn restock(&self, tenant_id: &str, lot_id: &str, quantity: i64) -> DbResult<()> {
        if quantity <= 0 {
            return Err(DbError::Internal(
                "restock quantity must be positive".to_string(),
            ));
        }

        debug!(lot_id = %lot_id, quantity, "Restocking lot");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE stock_lots
            SET quantity = quantity + ?3, updated_at = ?4
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(lot_id)
        .bind(tenant_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockLot", lot_id));
        }

        record_movement_with(&mut *tx, tenant_id, lot_id, MovementKind::In, quantity, None)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Applies a signed manual correction and records an `Adjustment`.
    ///
    /// Negative deltas go through the same guard as sale debits, so an
    /// adjustment can never push the lot below zero either.
    pub async fn adjust(&self, tenant_id: &str, lot_id: &str, delta: i64) -> DbResult<()> {
        if delta == 0 {
            return Ok(());
        }

        debug!(lot_id = %lot_id, delta, "Adjusting lot");

        let mut tx = self.pool.begin().await?;

        if delta > 0 {
            let result = sqlx::query(
                r#"
                UPDATE stock_lots
                SET quantity = quantity + ?3, updated_at = ?4
                WHERE id = ?1 AND tenant_id = ?2
                "#,
            )
            .bind(lot_id)
            .bind(tenant_id)
            .bind(delta)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("StockLot", lot_id));
            }
        } else {
            debit_with(&mut *tx, tenant_id, lot_id, -delta).await?;
        }

        record_movement_with(
            &mut *tx,
            tenant_id,
            lot_id,
            MovementKind::Adjustment,
            delta.abs(),
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Movement ledger for a lot, newest first.
    pub async fn movements_for_lot(
        &self,
        tenant_id: &str,
        lot_id: &str,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, tenant_id, lot_id, kind, quantity, sale_id, created_at
            FROM stock_movements
            WHERE tenant_id = ?1 AND lot_id = ?2
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(tenant_id)
        .bind(lot_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

/// Fetches a lot on any executor (pool or open transaction).
pub async fn get_by_id_with<'e, E>(
    executor: E,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<StockLot>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let lot = sqlx::query_as::<_, StockLot>(&format!(
        "{SELECT_COLUMNS} WHERE id = ?1 AND tenant_id = ?2"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(executor)
    .await?;

    Ok(lot)
}

/// Guarded decrement: only succeeds when the lot still has the units.
///
/// The WHERE clause carries the stock check, so concurrent debits serialize
/// on the row and the loser sees `InsufficientStock` rather than writing a
/// negative quantity. Takes a connection rather than a generic executor
/// because the failure path re-reads the row to report the real lot code
/// and remaining quantity.
pub async fn debit_with(
    conn: &mut sqlx::SqliteConnection,
    tenant_id: &str,
    lot_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE stock_lots
        SET quantity = quantity - ?3, updated_at = ?4
        WHERE id = ?1 AND tenant_id = ?2 AND quantity >= ?3
        "#,
    )
    .bind(lot_id)
    .bind(tenant_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let row: Option<(String, i64)> = sqlx::query_as(
            "SELECT lot_code, quantity FROM stock_lots WHERE id = ?1 AND tenant_id = ?2",
        )
        .bind(lot_id)
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

        return Err(match row {
            Some((lot_code, available)) => DbError::Core(CoreError::InsufficientStock {
                lot_code,
                available,
                requested: quantity,
            }),
            None => DbError::not_found("StockLot", lot_id),
        });
    }

    Ok(())
}

/// Appends one movement row on any executor.
pub async fn record_movement_with<'e, E>(
    executor: E,
    tenant_id: &str,
    lot_id: &str,
    kind: MovementKind,
    quantity: i64,
    sale_id: Option<&str>,
) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, tenant_id, lot_id, kind, quantity, sale_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(generate_id())
    .bind(tenant_id)
    .bind(lot_id)
    .bind(kind)
    .bind(quantity)
    .bind(sale_id)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use clinic_core::Product;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, tenant_id: &str) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            tenant_id: tenant_id.to_string(),
            name: "Botox 100U".to_string(),
            category_label: "Toxina Botulinica".to_string(),
            list_price_cents: 120000,
            stock_minimum: 2,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    fn lot_for(product: &Product, quantity: i64) -> StockLot {
        let now = Utc::now();
        StockLot {
            id: generate_id(),
            tenant_id: product.tenant_id.clone(),
            product_id: product.id.clone(),
            lot_code: "TOX-2027-01".to_string(),
            quantity,
            unit_cost_cents: 30000,
            expiry_date: NaiveDate::from_ymd_opt(2027, 1, 31).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_records_opening_movement() {
        let db = test_db().await;
        let product = seed_product(&db, "t1").await;
        let lot = lot_for(&product, 10);

        db.lots().insert(&lot).await.unwrap();

        let movements = db.lots().movements_for_lot("t1", &lot.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::In);
        assert_eq!(movements[0].quantity, 10);
        assert_eq!(movements[0].sale_id, None);
    }

    #[tokio::test]
    async fn test_debit_guard_refuses_overdraw() {
        let db = test_db().await;
        let product = seed_product(&db, "t1").await;
        let lot = lot_for(&product, 3);
        db.lots().insert(&lot).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        debit_with(&mut conn, "t1", &lot.id, 2).await.unwrap();

        // One unit left, asking for two must fail and leave the balance alone
        let err = debit_with(&mut conn, "t1", &lot.id, 2).await.unwrap_err();
        match err {
            DbError::Core(CoreError::InsufficientStock {
                lot_code,
                available,
                requested,
            }) => {
                // The error carries the business lot code and the real
                // remaining quantity, not placeholders
                assert_eq!(lot_code, "TOX-2027-01");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        drop(conn);

        let reloaded = db.lots().get_by_id("t1", &lot.id).await.unwrap().unwrap();
        assert_eq!(reloaded.quantity, 1);
    }

    #[tokio::test]
    async fn test_adjust_negative_cannot_go_below_zero() {
        let db = test_db().await;
        let product = seed_product(&db, "t1").await;
        let lot = lot_for(&product, 2);
        db.lots().insert(&lot).await.unwrap();

        let err = db.lots().adjust("t1", &lot.id, -5).await.unwrap_err();
        match err {
            DbError::Core(CoreError::InsufficientStock {
                lot_code,
                available,
                requested,
            }) => {
                assert_eq!(lot_code, "TOX-2027-01");
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        let reloaded = db.lots().get_by_id("t1", &lot.id).await.unwrap().unwrap();
        assert_eq!(reloaded.quantity, 2);
    }

    #[tokio::test]
    async fn test_restock_and_expiry_listing() {
        let db = test_db().await;
        let product = seed_product(&db, "t1").await;
        let lot = lot_for(&product, 1);
        db.lots().insert(&lot).await.unwrap();

        db.lots().restock("t1", &lot.id, 4).await.unwrap();

        let reloaded = db.lots().get_by_id("t1", &lot.id).await.unwrap().unwrap();
        assert_eq!(reloaded.quantity, 5);

        let expiring = db
            .lots()
            .list_expiring_before("t1", NaiveDate::from_ymd_opt(2027, 2, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(expiring.len(), 1);

        let not_yet = db
            .lots()
            .list_expiring_before("t1", NaiveDate::from_ymd_opt(2026, 12, 1).unwrap())
            .await
            .unwrap();
        assert!(not_yet.is_empty());
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let db = test_db().await;
        let product = seed_product(&db, "t1").await;
        let lot = lot_for(&product, 5);
        db.lots().insert(&lot).await.unwrap();

        assert!(db.lots().get_by_id("t2", &lot.id).await.unwrap().is_none());
    }
}
