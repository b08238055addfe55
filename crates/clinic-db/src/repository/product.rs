//! # Product Repository
//!
//! Database operations for catalog products (SKUs).
//!
//! ## Stock Minimum Policy
//! A product's available stock is the sum of its lots' remaining
//! quantities. `list_below_minimum` compares that sum against the
//! product's `stock_minimum` to drive the restock alert panel.

use chrono::Utc;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use clinic_core::Product;

const SELECT_COLUMNS: &str = r#"
    SELECT id, tenant_id, name, category_label, list_price_cents,
           stock_minimum, is_active, created_at, updated_at
    FROM products
"#;

/// A product together with its summed lot stock, for the restock panel.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductStockLevel {
    pub id: String,
    pub name: String,
    pub category_label: String,
    pub stock_minimum: i64,
    pub available: i64,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, name, category_label, list_price_cents,
                stock_minimum, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.name)
        .bind(&product.category_label)
        .bind(product.list_price_cents)
        .bind(product.stock_minimum)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by ID, tenant-scoped.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Product>> {
        get_by_id_with(&self.pool, tenant_id, id).await
    }

    /// Lists active products for a tenant, ordered by name.
    pub async fn list_active(&self, tenant_id: &str, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_COLUMNS} WHERE tenant_id = ?1 AND is_active = 1 ORDER BY name LIMIT ?2"
        ))
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?3,
                category_label = ?4,
                list_price_cents = ?5,
                stock_minimum = ?6,
                updated_at = ?7
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.name)
        .bind(&product.category_label)
        .bind(product.list_price_cents)
        .bind(product.stock_minimum)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical sale lines still reference this product.
    pub async fn soft_delete(&self, tenant_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET is_active = 0, updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Lists products whose summed lot stock is at or below their minimum.
    pub async fn list_below_minimum(&self, tenant_id: &str) -> DbResult<Vec<ProductStockLevel>> {
        let levels = sqlx::query_as::<_, ProductStockLevel>(
            r#"
            SELECT
                p.id,
                p.name,
                p.category_label,
                p.stock_minimum,
                COALESCE(SUM(l.quantity), 0) AS available
            FROM products p
            LEFT JOIN stock_lots l ON l.product_id = p.id
            WHERE p.tenant_id = ?1 AND p.is_active = 1
            GROUP BY p.id
            HAVING available <= p.stock_minimum
            ORDER BY p.name
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(levels)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE tenant_id = ?1 AND is_active = 1",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// Fetches a product on any executor (pool or open transaction).
pub async fn get_by_id_with<'e, E>(
    executor: E,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<Product>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let product = sqlx::query_as::<_, Product>(&format!(
        "{SELECT_COLUMNS} WHERE id = ?1 AND tenant_id = ?2"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use chrono::NaiveDate;
    use clinic_core::StockLot;

    const TENANT: &str = "clinic-1";

    fn product(name: &str, stock_minimum: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_id(),
            tenant_id: TENANT.to_string(),
            name: name.to_string(),
            category_label: "Toxina Botulinica".to_string(),
            list_price_cents: 10000,
            stock_minimum,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn lot(product_id: &str, code: &str, quantity: i64) -> StockLot {
        let now = Utc::now();
        StockLot {
            id: generate_id(),
            tenant_id: TENANT.to_string(),
            product_id: product_id.to_string(),
            lot_code: code.to_string(),
            quantity,
            unit_cost_cents: 4000,
            expiry_date: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_below_minimum_sums_across_lots() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        // Two lots of 2 against a minimum of 3: above threshold
        let well_stocked = product("Botox 100U", 3);
        db.products().insert(&well_stocked).await.unwrap();
        db.lots().insert(&lot(&well_stocked.id, "A-1", 2)).await.unwrap();
        db.lots().insert(&lot(&well_stocked.id, "A-2", 2)).await.unwrap();

        // One lot of 1 against a minimum of 2: below
        let short = product("Sculptra", 2);
        db.products().insert(&short).await.unwrap();
        db.lots().insert(&lot(&short.id, "B-1", 1)).await.unwrap();

        // No lots at all: below
        let empty = product("Profhilo", 1);
        db.products().insert(&empty).await.unwrap();

        let alerts = db.products().list_below_minimum(TENANT).await.unwrap();
        let names: Vec<&str> = alerts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Profhilo", "Sculptra"]);

        let profhilo = &alerts[0];
        assert_eq!(profhilo.available, 0);
        assert_eq!(profhilo.stock_minimum, 1);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sku = product("Botox 100U", 1);
        db.products().insert(&sku).await.unwrap();

        assert_eq!(db.products().list_active(TENANT, 50).await.unwrap().len(), 1);

        db.products().soft_delete(TENANT, &sku.id).await.unwrap();
        assert!(db.products().list_active(TENANT, 50).await.unwrap().is_empty());

        // Still fetchable by id for historical sale lines
        assert!(db.products().get_by_id(TENANT, &sku.id).await.unwrap().is_some());
    }
}
