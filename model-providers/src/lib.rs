//! # model-providers
//!
//! Language-model backends behind one object-safe trait, plus the
//! [`ProviderService`] facade the bot talks to.
//!
//! A backend turns a message list into either a complete answer or a
//! [`FragmentStream`]: a single-pass, finite, pull-based stream of text
//! fragments in generation order. The consumer drives it; dropping the
//! stream is the only cancellation.

use std::pin::Pin;

use async_trait::async_trait;
use bot_core::{BackendKind, ChatMessage};
use futures::Stream;

pub mod aggregator;
pub mod counters;
pub mod error;
pub mod ollama;
pub mod openai;
pub mod service;

pub use aggregator::AggregatorBackend;
pub use counters::ResponseCounters;
pub use error::{ProviderError, ProviderResult};
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use service::ProviderService;

/// Lazy sequence of text fragments from a streaming backend. Fragments are
/// yielded in arrival order; an `Err` item terminates the stream.
pub type FragmentStream = Pin<Box<dyn Stream<Item = ProviderResult<String>> + Send>>;

/// One model backend family (OpenAI API, Ollama, aggregator).
///
/// Implementations are stateless with respect to users: they receive the full
/// message context on every call and never touch persistence.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Full-text completion for the given context.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> ProviderResult<String>;

    /// Streamed completion. The returned stream is single-pass; restarting
    /// means calling again.
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> ProviderResult<FragmentStream>;
}
