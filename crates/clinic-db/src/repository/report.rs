//! # Report Repository
//!
//! Read-only aggregates for the dashboard. Everything here is derived from
//! the sales and expense tables with GROUP BY queries; nothing is cached
//! or precomputed.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;

/// One month of revenue figures.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MonthlyRevenue {
    /// Month as "YYYY-MM".
    pub period: String,
    pub sale_count: i64,
    pub gross_cents: i64,
    pub final_cents: i64,
    pub margin_cents: i64,
    pub margin_final_cents: i64,
}

/// Revenue attributed to one category label within a month.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryRevenue {
    /// Category label frozen on the sale line.
    pub category: String,
    pub units: i64,
    pub revenue_cents: i64,
}

/// Month-level profit summary: revenue net of commission expenses.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub sale_count: i64,
    pub final_cents: i64,
    pub margin_final_cents: i64,
    pub commission_cents: i64,
    /// margin_final minus commissions.
    pub net_cents: i64,
}

/// Repository for dashboard aggregates.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Revenue per month across a calendar year. Months with no sales are
    /// simply absent.
    pub async fn monthly_revenue(
        &self,
        tenant_id: &str,
        year: i32,
    ) -> DbResult<Vec<MonthlyRevenue>> {
        let rows = sqlx::query_as::<_, MonthlyRevenue>(
            r#"
            SELECT
                strftime('%Y-%m', sale_date) AS period,
                COUNT(*) AS sale_count,
                COALESCE(SUM(gross_cents), 0) AS gross_cents,
                COALESCE(SUM(final_cents), 0) AS final_cents,
                COALESCE(SUM(margin_cents), 0) AS margin_cents,
                COALESCE(SUM(margin_final_cents), 0) AS margin_final_cents
            FROM sales
            WHERE tenant_id = ?1 AND strftime('%Y', sale_date) = ?2
            GROUP BY period
            ORDER BY period
            "#,
        )
        .bind(tenant_id)
        .bind(format!("{year:04}"))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Units and revenue per frozen category label within a month.
    pub async fn category_mix(
        &self,
        tenant_id: &str,
        month: u32,
        year: i32,
    ) -> DbResult<Vec<CategoryRevenue>> {
        let period = format!("{year:04}-{month:02}");

        let rows = sqlx::query_as::<_, CategoryRevenue>(
            r#"
            SELECT
                l.category_snapshot AS category,
                COALESCE(SUM(l.quantity), 0) AS units,
                COALESCE(SUM(l.line_total_cents), 0) AS revenue_cents
            FROM sale_lines l
            JOIN sales s ON s.id = l.sale_id
            WHERE s.tenant_id = ?1 AND strftime('%Y-%m', s.sale_date) = ?2
            GROUP BY l.category_snapshot
            ORDER BY revenue_cents DESC
            "#,
        )
        .bind(tenant_id)
        .bind(period)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Revenue, margin and commission totals for one accounting month.
    pub async fn period_summary(
        &self,
        tenant_id: &str,
        month: u32,
        year: i32,
    ) -> DbResult<PeriodSummary> {
        let period = format!("{year:04}-{month:02}");

        let (sale_count, final_cents, margin_final_cents): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(final_cents), 0),
                COALESCE(SUM(margin_final_cents), 0)
            FROM sales
            WHERE tenant_id = ?1 AND strftime('%Y-%m', sale_date) = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(&period)
        .fetch_one(&self.pool)
        .await?;

        let commission_cents: i64 = sqlx::query_scalar(
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

        Ok(PeriodSummary {
            sale_count,
            final_cents,
            margin_final_cents,
            commission_cents,
            net_cents: margin_final_cents - commission_cents,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
