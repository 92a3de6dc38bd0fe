use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A (resource, action) grant such as `access:manage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub resource: String,
    pub action: String,
}

impl Permission {
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        self.resource == resource && self.action == action
    }
}
