use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Model API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("No backend configured for {0:?}")]
    BackendUnavailable(bot_core::BackendKind),

    #[error("Store error: {0}")]
    Store(String),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
