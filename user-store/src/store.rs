use async_trait::async_trait;
use bot_core::{UserRecord, UserSeed};

use crate::error::StoreResult;

/// Keyed CRUD over user records. Single-process semantics: `get_or_create`
/// is read-then-create-if-absent, `save` overwrites the whole record.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetches a record; [`crate::StoreError::NotFound`] when absent.
    async fn get(&self, id: i64) -> StoreResult<UserRecord>;

    /// Fetches a record, creating it from the seed on first contact.
    async fn get_or_create(&self, id: i64, seed: &UserSeed) -> StoreResult<UserRecord>;

    /// Writes the record back, replacing whatever is stored.
    async fn save(&self, user: &UserRecord) -> StoreResult<()>;

    /// Deletes a record; returns whether it existed.
    async fn delete(&self, id: i64) -> StoreResult<bool>;

    /// Every stored record, ordered by id. Admin listing and export.
    async fn all(&self) -> StoreResult<Vec<UserRecord>>;
}
