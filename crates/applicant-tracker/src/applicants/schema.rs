//! Table definition for the `applicants` store.
//!
//! Applied idempotently at startup. Email uniqueness is enforced only among
//! rows that are not soft-deleted.

use sqlx::PgPool;
use tracing::info;

pub const TABLE: &str = "applicants";

pub const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS applicants (
    id          BIGSERIAL PRIMARY KEY,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    deleted_at  TIMESTAMPTZ,
    name        VARCHAR(100) NOT NULL,
    email       VARCHAR(150) NOT NULL,
    position    VARCHAR(100) NOT NULL,
    status      VARCHAR(20)  NOT NULL DEFAULT 'pending',
    phone       VARCHAR(20),
    resume      TEXT,
    notes       TEXT
)
"#;

pub const CREATE_INDEXES: [&str; 5] = [
    "CREATE INDEX IF NOT EXISTS idx_applicants_email ON applicants(email)",
    "CREATE INDEX IF NOT EXISTS idx_applicants_status ON applicants(status)",
    "CREATE INDEX IF NOT EXISTS idx_applicants_created_at ON applicants(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_applicants_deleted_at ON applicants(deleted_at)",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_applicants_active_email ON applicants(email) WHERE deleted_at IS NULL",
];

/// Column list shared by every query that materializes an [`Applicant`](super::Applicant).
pub const COLUMNS: &str =
    "id, created_at, updated_at, deleted_at, name, email, position, status, phone, resume, notes";

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_TABLE).execute(pool).await?;
    for statement in CREATE_INDEXES {
        sqlx::query(statement).execute(pool).await?;
    }

    info!(table = TABLE, "schema ensured");
    Ok(())
}
