//! In-memory user store: a `RwLock<HashMap>`. Used by tests and ephemeral runs.

use std::collections::HashMap;

use async_trait::async_trait;
use bot_core::{UserRecord, UserSeed};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::store::UserStore;

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<i64, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records; handy in tests.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, id: i64) -> StoreResult<UserRecord> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn get_or_create(&self, id: i64, seed: &UserSeed) -> StoreResult<UserRecord> {
        let mut users = self.users.write().await;
        let record = users
            .entry(id)
            .or_insert_with(|| seed.clone().into_record(id));
        Ok(record.clone())
    }

    async fn save(&self, user: &UserRecord) -> StoreResult<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn all(&self) -> StoreResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}
