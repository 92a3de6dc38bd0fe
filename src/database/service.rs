use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::IdentityStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{AccessRow, Group, GroupRow, Identity, Permission};
use crate::types::Status;

const ACCESS_COLUMNS: &str =
    "id, name, email, api_key, group_id, expired_date, rate_limit, status_id";

/// Postgres-backed identity lookups against the `access` table
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
    default_rate_limit: u32,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool, default_rate_limit: u32) -> Self {
        Self {
            pool,
            default_rate_limit,
        }
    }

    /// Load an active group together with its active permissions
    async fn load_group(&self, group_id: i32) -> Result<Option<Group>, DatabaseError> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, name, description
             FROM groups
             WHERE id = $1 AND status_id = $2 AND deleted_at IS NULL",
        )
        .bind(group_id)
        .bind(Status::Active.id())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT p.id, p.name, p.description, p.resource, p.action
             FROM permissions p
             JOIN group_permissions gp ON gp.permission_id = p.id
             WHERE gp.group_id = $1 AND p.status_id = $2 AND p.deleted_at IS NULL
             ORDER BY p.id",
        )
        .bind(group_id)
        .bind(Status::Active.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Group::from_row(row, permissions)))
    }

    async fn hydrate(&self, row: AccessRow) -> Result<Identity, DatabaseError> {
        let group = match row.group_id {
            Some(group_id) => self.load_group(group_id).await?,
            None => None,
        };
        Ok(Identity::from_row(row, group, self.default_rate_limit))
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Identity>, DatabaseError> {
        // Liveness and expiry are judged by the resolver, not here
        let row = sqlx::query_as::<_, AccessRow>(&format!(
            "SELECT {ACCESS_COLUMNS} FROM access WHERE api_key = $1 AND deleted_at IS NULL"
        ))
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DatabaseError> {
        let row = sqlx::query_as::<_, AccessRow>(&format!(
            "SELECT {ACCESS_COLUMNS} FROM access
             WHERE id = $1 AND status_id = $2 AND deleted_at IS NULL"
        ))
        .bind(id)
        .bind(Status::Active.id())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn update_expired_date(
        &self,
        id: Uuid,
        expired_date: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE access SET expired_date = $2, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(expired_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("access {id}")));
        }
        Ok(())
    }

    async fn update_rate_limit(&self, id: Uuid, rate_limit: u32) -> Result<(), DatabaseError> {
        let rate_limit = i32::try_from(rate_limit).unwrap_or(i32::MAX);
        let result = sqlx::query(
            "UPDATE access SET rate_limit = $2, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(rate_limit)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("access {id}")));
        }
        Ok(())
    }
}
