//! Local-inference backend speaking the Ollama HTTP API.
//!
//! Batch: `POST /api/chat` with `stream: false`. Streaming: same endpoint
//! with `stream: true`, which returns newline-delimited JSON chunks; lines
//! are reassembled across HTTP frame boundaries before parsing.

use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use bot_core::{BackendKind, ChatMessage};
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::{FragmentStream, ModelBackend};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

#[derive(Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    host: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// Parses one NDJSON line into (fragment content, done flag).
fn parse_chunk_line(line: &str) -> ProviderResult<(String, bool)> {
    let chunk: ChatChunk =
        serde_json::from_str(line).map_err(|e| ProviderError::Stream(e.to_string()))?;
    if let Some(error) = chunk.error {
        return Err(ProviderError::Api(error));
    }
    let content = chunk.message.map(|m| m.content).unwrap_or_default();
    Ok((content, chunk.done))
}

impl OllamaBackend {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.host.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> ProviderResult<String> {
        info!(model, "Calling Ollama chat");
        let response = self
            .client
            .post(self.chat_url())
            .json(&ChatRequest {
                model,
                messages,
                stream: false,
                options: ChatOptions { temperature },
            })
            .send()
            .await?
            .error_for_status()?;

        let chunk: ChatChunk = response.json().await?;
        if let Some(error) = chunk.error {
            return Err(ProviderError::Api(error));
        }
        Ok(chunk.message.map(|m| m.content).unwrap_or_default())
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> ProviderResult<FragmentStream> {
        info!(model, "Starting Ollama chat stream");
        let response = self
            .client
            .post(self.chat_url())
            .json(&ChatRequest {
                model,
                messages,
                stream: true,
                options: ChatOptions { temperature },
            })
            .send()
            .await?
            .error_for_status()?;

        struct State {
            bytes: Pin<Box<dyn futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Send>>,
            buffer: String,
            pending: VecDeque<String>,
            finished: bool,
        }

        let state = State {
            bytes: Box::pin(response.bytes_stream()),
            buffer: String::new(),
            pending: VecDeque::new(),
            finished: false,
        };

        let fragments = stream::unfold(state, |mut st| async move {
            loop {
                if let Some(fragment) = st.pending.pop_front() {
                    return Some((Ok(fragment), st));
                }
                if st.finished {
                    return None;
                }
                match st.bytes.next().await {
                    None => {
                        st.finished = true;
                    }
                    Some(Err(e)) => {
                        st.finished = true;
                        return Some((Err(ProviderError::Http(e)), st));
                    }
                    Some(Ok(bytes)) => {
                        st.buffer.push_str(&String::from_utf8_lossy(&bytes));
                        while let Some(pos) = st.buffer.find('\n') {
                            let line = st.buffer[..pos].trim().to_string();
                            st.buffer.drain(..=pos);
                            if line.is_empty() {
                                continue;
                            }
                            match parse_chunk_line(&line) {
                                Ok((content, done)) => {
                                    if !content.is_empty() {
                                        st.pending.push_back(content);
                                    }
                                    if done {
                                        st.finished = true;
                                    }
                                }
                                Err(e) => {
                                    st.finished = true;
                                    st.pending.clear();
                                    return Some((Err(e), st));
                                }
                            }
                        }
                    }
                }
            }
        });

        Ok(Box::pin(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_chunk() {
        let (content, done) =
            parse_chunk_line(r#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#)
                .unwrap();
        assert_eq!(content, "Hel");
        assert!(!done);
    }

    #[test]
    fn parses_final_chunk_without_content() {
        let (content, done) =
            parse_chunk_line(r#"{"done":true,"total_duration":12345}"#).unwrap();
        assert_eq!(content, "");
        assert!(done);
    }

    #[test]
    fn surfaces_inline_errors() {
        let err = parse_chunk_line(r#"{"error":"model not found"}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Api(ref m) if m == "model not found"));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(
            parse_chunk_line("not json"),
            Err(ProviderError::Stream(_))
        ));
    }
}
