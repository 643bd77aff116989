//! Postgres implementation of [`ApplicantRepository`] using SQLx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::info;

use super::domain::{Applicant, ApplicantChanges, ApplicantId, ApplicantStatus, NewApplicant};
use super::repository::{ApplicantRepository, RepositoryError};
use super::schema::COLUMNS;
use crate::config::DatabaseConfig;

/// Open a bounded connection pool.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        host = %config.host,
        port = config.port,
        database = %config.name,
        "connecting to postgres"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_open_connections)
        .min_connections(config.max_idle_connections.min(config.max_open_connections))
        .max_lifetime(config.connection_max_lifetime)
        .connect_with(config.connect_options())
        .await?;

    info!("connected to postgres");
    Ok(pool)
}

#[derive(Clone)]
pub struct PgApplicantRepository {
    pool: PgPool,
}

impl PgApplicantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        _ => RepositoryError::Unavailable(err.to_string()),
    }
}

/// Row to domain mapping. The status column is free text in the table, so an
/// unknown label is reported rather than silently defaulted.
fn applicant_from_row(row: &PgRow) -> Result<Applicant, RepositoryError> {
    let status: String = row.try_get("status").map_err(map_sqlx)?;
    let status = ApplicantStatus::from_label(&status).ok_or_else(|| {
        RepositoryError::Unavailable(format!("unknown status '{status}' in store"))
    })?;

    let id: i64 = row.try_get("id").map_err(map_sqlx)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(map_sqlx)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(map_sqlx)?;
    let deleted_at: Option<DateTime<Utc>> = row.try_get("deleted_at").map_err(map_sqlx)?;

    Ok(Applicant {
        id: ApplicantId(id),
        created_at,
        updated_at,
        deleted_at,
        name: row.try_get("name").map_err(map_sqlx)?,
        email: row.try_get("email").map_err(map_sqlx)?,
        position: row.try_get("position").map_err(map_sqlx)?,
        status,
        phone: row.try_get("phone").map_err(map_sqlx)?,
        resume: row.try_get("resume").map_err(map_sqlx)?,
        notes: row.try_get("notes").map_err(map_sqlx)?,
    })
}

#[async_trait]
impl ApplicantRepository for PgApplicantRepository {
    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM applicants WHERE email = $1 AND deleted_at IS NULL)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.try_get::<bool, _>(0).map_err(map_sqlx)
    }

    async fn insert(&self, applicant: NewApplicant) -> Result<Applicant, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO applicants (name, email, position, status, phone, resume, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(&applicant.name)
            .bind(&applicant.email)
            .bind(&applicant.position)
            .bind(applicant.status.label())
            .bind(&applicant.phone)
            .bind(&applicant.resume)
            .bind(&applicant.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;

        applicant_from_row(&row)
    }

    async fn fetch(&self, id: ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM applicants WHERE id = $1 AND deleted_at IS NULL");

        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.as_ref().map(applicant_from_row).transpose()
    }

    async fn list(&self, offset: u64, limit: u32) -> Result<Vec<Applicant>, RepositoryError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM applicants WHERE deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2"
        );
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.iter().map(applicant_from_row).collect()
    }

    async fn update(
        &self,
        id: ApplicantId,
        changes: ApplicantChanges,
    ) -> Result<Applicant, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE applicants SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                position = COALESCE($4, position),
                status = COALESCE($5, status),
                phone = COALESCE($6, phone),
                resume = COALESCE($7, resume),
                notes = COALESCE($8, notes),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(id.0)
            .bind(&changes.name)
            .bind(&changes.email)
            .bind(&changes.position)
            .bind(changes.status.map(ApplicantStatus::label))
            .bind(&changes.phone)
            .bind(&changes.resume)
            .bind(&changes.notes)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or(RepositoryError::NotFound)?;

        applicant_from_row(&row)
    }

    async fn soft_delete(&self, id: ApplicantId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE applicants SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
