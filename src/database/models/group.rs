use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::permission::Permission;

#[derive(Debug, Clone, FromRow)]
pub struct GroupRow {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// Permission group with its active permissions preloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub permissions: Vec<Permission>,
}

impl Group {
    pub fn from_row(row: GroupRow, permissions: Vec<Permission>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            permissions,
        }
    }

    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        self.permissions.iter().any(|p| p.matches(resource, action))
    }
}
