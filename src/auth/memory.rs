use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::IdentityStore;
use crate::database::models::Identity;
use crate::database::DatabaseError;

/// Identity store held in process memory; used by `--in-memory` and tests
#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: RwLock<HashMap<Uuid, Identity>>,
}

impl MemoryIdentityStore {
    pub fn new(identities: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            identities: RwLock::new(identities.into_iter().map(|i| (i.id, i)).collect()),
        }
    }

    pub fn insert(&self, identity: Identity) {
        let mut identities = self.identities.write().unwrap_or_else(|e| e.into_inner());
        identities.insert(identity.id, identity);
    }

    fn update<F>(&self, id: Uuid, apply: F) -> Result<(), DatabaseError>
    where
        F: FnOnce(&mut Identity),
    {
        let mut identities = self.identities.write().unwrap_or_else(|e| e.into_inner());
        let identity = identities
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("access {id}")))?;
        apply(identity);
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Identity>, DatabaseError> {
        let identities = self.identities.read().unwrap_or_else(|e| e.into_inner());
        Ok(identities.values().find(|i| i.api_key == api_key).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DatabaseError> {
        let identities = self.identities.read().unwrap_or_else(|e| e.into_inner());
        Ok(identities.get(&id).filter(|i| i.is_active()).cloned())
    }

    async fn update_expired_date(
        &self,
        id: Uuid,
        expired_date: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        self.update(id, |identity| identity.expired_date = expired_date)
    }

    async fn update_rate_limit(&self, id: Uuid, rate_limit: u32) -> Result<(), DatabaseError> {
        self.update(id, |identity| identity.rate_limit = rate_limit)
    }
}
