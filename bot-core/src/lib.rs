//! # bot-core
//!
//! Core types and traits for the relay bot: [`Transport`], [`AccessLevel`],
//! conversation types, the model registry, and tracing initialization.
//! Transport-agnostic; used by user-store, model-providers, and relay-bot.

pub mod access;
pub mod conversation;
pub mod error;
pub mod logger;
pub mod models;
pub mod transport;
pub mod types;

pub use access::{AccessLevel, ALL_LEVELS};
pub use conversation::{ChatMessage, ConversationHistory, Role};
pub use error::{CoreError, Result};
pub use logger::init_tracing;
pub use models::{
    active_models, default_model, find_model, models_available_to, BackendKind, ModelSpec,
    MODEL_REGISTRY,
};
pub use transport::Transport;
pub use types::{Button, Chat, Keyboard, UserRecord, UserSeed};
