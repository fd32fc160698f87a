use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid access level: {0}")]
    InvalidAccessLevel(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
