//! OpenAI API backend via async-openai: batch and native streaming.

use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use bot_core::{BackendKind, ChatMessage, Role};
use futures::StreamExt;
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::{FragmentStream, ModelBackend};

#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client<async_openai::config::OpenAIConfig>,
}

impl OpenAiBackend {
    pub fn new(api_key: String) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Client::with_config(config),
        }
    }

    fn build_request(
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
        stream: bool,
    ) -> ProviderResult<async_openai::types::CreateChatCompletionRequest> {
        let mut converted = Vec::with_capacity(messages.len());
        for msg in messages {
            converted.push(to_openai_message(msg)?);
        }
        CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(converted)
            .temperature(temperature)
            .stream(stream)
            .build()
            .map_err(|e| ProviderError::Api(e.to_string()))
    }
}

/// Converts a core message into the OpenAI request shape.
fn to_openai_message(msg: &ChatMessage) -> ProviderResult<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let converted: ChatCompletionRequestMessage = match msg.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| ProviderError::Api(e.to_string()))?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| ProviderError::Api(e.to_string()))?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| ProviderError::Api(e.to_string()))?
            .into(),
    };
    Ok(converted)
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenAi
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> ProviderResult<String> {
        info!(model, "Calling OpenAI chat completion");
        let request = Self::build_request(messages, model, temperature, false)?;
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::Api("No choices in OpenAI response".to_string()))
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> ProviderResult<FragmentStream> {
        info!(model, "Starting OpenAI chat completion stream");
        let request = Self::build_request(messages, model, temperature, true)?;
        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        let fragments = stream.filter_map(|item| async move {
            match item {
                Ok(chunk) => chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .filter(|content| !content.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(ProviderError::Stream(e.to_string()))),
            }
        });

        Ok(Box::pin(fragments))
    }
}
