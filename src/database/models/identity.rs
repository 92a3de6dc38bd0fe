use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::group::Group;
use crate::types;

/// Raw row from the `access` table
#[derive(Debug, Clone, FromRow)]
pub struct AccessRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub api_key: String,
    pub group_id: Option<i32>,
    pub expired_date: Option<DateTime<Utc>>,
    pub rate_limit: i32,
    pub status_id: i16,
}

/// The principal behind an API key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub api_key: String,
    pub group_id: Option<i32>,
    pub group: Option<Group>,
    pub expired_date: Option<DateTime<Utc>>,
    /// Requests per minute; always populated
    pub rate_limit: u32,
    pub status_id: i16,
}

impl Identity {
    /// Build from a stored row. Quotas below 1 fall back to `default_rate_limit`.
    pub fn from_row(row: AccessRow, group: Option<Group>, default_rate_limit: u32) -> Self {
        let rate_limit = u32::try_from(row.rate_limit)
            .ok()
            .filter(|limit| *limit > 0)
            .unwrap_or(default_rate_limit);

        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            api_key: row.api_key,
            group_id: row.group_id,
            group,
            expired_date: row.expired_date,
            rate_limit,
            status_id: row.status_id,
        }
    }

    pub fn is_active(&self) -> bool {
        types::is_active(self.status_id)
    }

    /// An expiration equal to `now` counts as expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expired_date, Some(expires) if expires <= now)
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && !self.is_expired_at(now)
    }

    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        self.group
            .as_ref()
            .map(|g| g.has_permission(resource, action))
            .unwrap_or(false)
    }
}
