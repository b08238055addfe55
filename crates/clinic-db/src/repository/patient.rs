//! # Patient Repository
//!
//! Database operations for patient records. Plain CRUD: the interesting
//! part of a patient, from this layer's perspective, is that sales
//! reference them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use clinic_core::Patient;

/// Repository for patient database operations.
#[derive(Debug, Clone)]
pub struct PatientRepository {
    pool: SqlitePool,
}

impl PatientRepository {
    /// Creates a new PatientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PatientRepository { pool }
    }

    /// Inserts a new patient.
    pub async fn insert(&self, patient: &Patient) -> DbResult<()> {
        debug!(id = %patient.id, tenant_id = %patient.tenant_id, "Inserting patient");

        sqlx::query(
            r#"
            INSERT INTO patients (
                id, tenant_id, name, phone, notes, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&patient.id)
        .bind(&patient.tenant_id)
        .bind(&patient.name)
        .bind(&patient.phone)
        .bind(&patient.notes)
        .bind(patient.is_active)
        .bind(patient.created_at)
        .bind(patient.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a patient by ID, tenant-scoped.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            SELECT id, tenant_id, name, phone, notes, is_active, created_at, updated_at
            FROM patients
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(patient)
    }

    /// Lists active patients for a tenant, ordered by name.
    pub async fn list(&self, tenant_id: &str, limit: u32) -> DbResult<Vec<Patient>> {
        let patients = sqlx::query_as::<_, Patient>(
            r#"
            SELECT id, tenant_id, name, phone, notes, is_active, created_at, updated_at
            FROM patients
            WHERE tenant_id = ?1 AND is_active = 1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(patients)
    }

    /// Updates a patient's editable fields.
    pub async fn update(&self, patient: &Patient) -> DbResult<()> {
        debug!(id = %patient.id, "Updating patient");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE patients SET
                name = ?3,
                phone = ?4,
                notes = ?5,
                updated_at = ?6
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(&patient.id)
        .bind(&patient.tenant_id)
        .bind(&patient.name)
        .bind(&patient.phone)
        .bind(&patient.notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Patient", &patient.id));
        }

        Ok(())
    }

    /// Soft-deletes a patient.
    ///
    /// Historical sales still reference the row, so rows are never removed.
    pub async fn soft_delete(&self, tenant_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting patient");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE patients SET is_active = 0, updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Patient", id));
        }

        Ok(())
    }
}
