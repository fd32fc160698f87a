use bot_core::CoreError;
use model_providers::ProviderError;
use thiserror::Error;
use user_store::StoreError;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Access denied")]
    AuthDenied,

    #[error("Wrong argument count: expected {expected}, got {got}")]
    ArgumentMismatch { expected: usize, got: usize },

    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Config error: {0}")]
    Config(String),
}

pub type BotResult<T> = std::result::Result<T, BotError>;
