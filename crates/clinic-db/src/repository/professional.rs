//! # Professional Repository
//!
//! Database operations for staff members. The commission derivation at
//! checkout reads the profile and rate from here; everything else is CRUD.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use clinic_core::Professional;

const SELECT_COLUMNS: &str = r#"
    SELECT id, tenant_id, name, profile, commission_rate_bps,
           is_active, created_at, updated_at
    FROM professionals
"#;

/// Repository for professional database operations.
#[derive(Debug, Clone)]
pub struct ProfessionalRepository {
    pool: SqlitePool,
}

impl ProfessionalRepository {
    /// Creates a new ProfessionalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProfessionalRepository { pool }
    }

    /// Inserts a new professional.
    pub async fn insert(&self, professional: &Professional) -> DbResult<()> {
        debug!(id = %professional.id, name = %professional.name, "Inserting professional");

        sqlx::query(
            r#"
            INSERT INTO professionals (
                id, tenant_id, name, profile, commission_rate_bps,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&professional.id)
        .bind(&professional.tenant_id)
        .bind(&professional.name)
        .bind(professional.profile)
        .bind(professional.commission_rate_bps)
        .bind(professional.is_active)
        .bind(professional.created_at)
        .bind(professional.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a professional by ID, tenant-scoped.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Professional>> {
        get_by_id_with(&self.pool, tenant_id, id).await
    }

    /// Lists active professionals for a tenant, ordered by name.
    pub async fn list_active(&self, tenant_id: &str) -> DbResult<Vec<Professional>> {
        let professionals = sqlx::query_as::<_, Professional>(&format!(
            "{SELECT_COLUMNS} WHERE tenant_id = ?1 AND is_active = 1 ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(professionals)
    }

    /// Updates a professional's editable fields (name, profile, rate).
    pub async fn update(&self, professional: &Professional) -> DbResult<()> {
        debug!(id = %professional.id, "Updating professional");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE professionals SET
                name = ?3,
                profile = ?4,
                commission_rate_bps = ?5,
                updated_at = ?6
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(&professional.id)
        .bind(&professional.tenant_id)
        .bind(&professional.name)
        .bind(professional.profile)
        .bind(professional.commission_rate_bps)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Professional", &professional.id));
        }

        Ok(())
    }

    /// Soft-deletes a professional.
    pub async fn soft_delete(&self, tenant_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting professional");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE professionals SET is_active = 0, updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Professional", id));
        }

        Ok(())
    }
}

/// Fetches a professional on any executor (pool or open transaction).
///
/// The checkout transaction uses this to re-read the professional under the
/// same snapshot it writes in.
pub async fn get_by_id_with<'e, E>(
    executor: E,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<Professional>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let professional = sqlx::query_as::<_, Professional>(&format!(
        "{SELECT_COLUMNS} WHERE id = ?1 AND tenant_id = ?2"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(executor)
    .await?;

    Ok(professional)
}
