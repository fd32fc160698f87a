use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record for user {0}: {1}")]
    Corrupt(i64, String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
