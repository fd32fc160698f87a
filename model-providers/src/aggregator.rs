//! Free aggregator backend: an OpenAI-compatible `/chat/completions`
//! endpoint, typically a community gateway. Batch only; streamed requests
//! are served by replaying the batch answer as one fragment.

use async_trait::async_trait;
use bot_core::{BackendKind, ChatMessage};
use futures::stream;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::{FragmentStream, ModelBackend};

#[derive(Clone)]
pub struct AggregatorBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl AggregatorBackend {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelBackend for AggregatorBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Aggregator
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> ProviderResult<String> {
        info!(model, "Calling aggregator chat completion");
        let mut request = self.client.post(self.completions_url()).json(&CompletionRequest {
            model,
            messages,
            temperature,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response: CompletionResponse =
            request.send().await?.error_for_status()?.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Api("No choices in aggregator response".to_string()))
    }

    /// The gateway has no reliable streaming mode, so the whole answer
    /// arrives as a single fragment. An empty answer yields no fragments.
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> ProviderResult<FragmentStream> {
        let answer = self.chat(messages, model, temperature).await?;
        let fragments: Vec<ProviderResult<String>> = if answer.is_empty() {
            Vec::new()
        } else {
            vec![Ok(answer)]
        };
        Ok(Box::pin(stream::iter(fragments)))
    }
}
