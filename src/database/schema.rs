use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

/// Tables are created in dependency order; every statement is idempotent.
const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS permissions (
        id          SERIAL PRIMARY KEY,
        name        TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        resource    TEXT NOT NULL,
        action      TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        deleted_at  TIMESTAMPTZ,
        status_id   SMALLINT NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS groups (
        id          SERIAL PRIMARY KEY,
        name        TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        deleted_at  TIMESTAMPTZ,
        status_id   SMALLINT NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS group_permissions (
        group_id      INTEGER NOT NULL REFERENCES groups(id),
        permission_id INTEGER NOT NULL REFERENCES permissions(id),
        PRIMARY KEY (group_id, permission_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS access (
        id           UUID PRIMARY KEY,
        name         TEXT NOT NULL,
        email        TEXT NOT NULL UNIQUE,
        api_key      TEXT NOT NULL UNIQUE,
        group_id     INTEGER REFERENCES groups(id),
        expired_date TIMESTAMPTZ,
        rate_limit   INTEGER NOT NULL DEFAULT 120,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        deleted_at   TIMESTAMPTZ,
        status_id    SMALLINT NOT NULL DEFAULT 1
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_access_group_id ON access (group_id)",
    "CREATE INDEX IF NOT EXISTS idx_access_expired_date ON access (expired_date)",
    "CREATE INDEX IF NOT EXISTS idx_access_status_id ON access (status_id)",
];

/// Create the access-control tables if they do not exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema verified ({} statements)", STATEMENTS.len());
    Ok(())
}
