//! SQLite-backed user store: one `users` table, conversation as a JSON column.

use async_trait::async_trait;
use bot_core::{AccessLevel, ConversationHistory, UserRecord, UserSeed};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::store::UserStore;

#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

/// Raw row shape; converted to [`UserRecord`] after JSON decoding.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    username: Option<String>,
    language_code: Option<String>,
    access_level: i64,
    chosen_model: String,
    conversation: String,
}

impl UserRow {
    fn into_record(self) -> StoreResult<UserRecord> {
        let conversation: ConversationHistory = serde_json::from_str(&self.conversation)?;
        let access_level = AccessLevel::from_raw(self.access_level)
            .map_err(|e| StoreError::Corrupt(self.id, e.to_string()))?;
        Ok(UserRecord {
            id: self.id,
            first_name: self.first_name,
            username: self.username,
            language_code: self.language_code,
            access_level,
            chosen_model: self.chosen_model,
            conversation,
        })
    }
}

impl SqliteUserStore {
    /// Opens (creating if missing) the database at `database_url` and ensures
    /// the schema exists.
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        info!(database_url, "Initializing SQLite user store");

        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(database_url);
        let pool = SqlitePool::connect_with(options).await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                username TEXT,
                language_code TEXT,
                access_level INTEGER NOT NULL,
                chosen_model TEXT NOT NULL,
                conversation TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get(&self, id: i64) -> StoreResult<UserRecord> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, first_name, username, language_code, access_level, chosen_model, conversation \
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::NotFound(id))?.into_record()
    }

    async fn get_or_create(&self, id: i64, seed: &UserSeed) -> StoreResult<UserRecord> {
        match self.get(id).await {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound(_)) => {
                info!(user_id = id, "Creating new user");
                let record = seed.clone().into_record(id);
                self.save(&record).await?;
                Ok(record)
            }
            Err(e) => Err(e),
        }
    }

    async fn save(&self, user: &UserRecord) -> StoreResult<()> {
        debug!(user_id = user.id, "Saving user");
        let conversation = serde_json::to_string(&user.conversation)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO users
                (id, first_name, username, language_code, access_level, chosen_model, conversation, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.username)
        .bind(&user.language_code)
        .bind(user.access_level.rank())
        .bind(&user.chosen_model)
        .bind(conversation)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let existed = result.rows_affected() > 0;
        debug!(user_id = id, existed, "Deleted user");
        Ok(existed)
    }

    async fn all(&self) -> StoreResult<Vec<UserRecord>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, first_name, username, language_code, access_level, chosen_model, conversation \
             FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_record).collect()
    }
}
