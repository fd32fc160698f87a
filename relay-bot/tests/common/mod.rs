//! Shared test doubles: a recording transport and a scripted model backend,
//! plus a context builder wiring them into a `BotContext`.

// Each test binary uses a subset of this module.
#![allow(dead_code)]

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bot_core::{BackendKind, Chat, ChatMessage, Keyboard, Result, Transport};
use futures::stream;
use model_providers::{
    FragmentStream, ModelBackend, ProviderError, ProviderResult, ProviderService,
};
use relay_bot::router::BotContext;
use relay_bot::{StreamRelay, UserLocks};
use user_store::MemoryUserStore;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send { chat_id: i64, text: String },
    SendWithKeyboard { chat_id: i64, text: String, buttons: Vec<(String, String)> },
    Edit { message_id: String, text: String },
    EditWithKeyboard { message_id: String, text: String, buttons: Vec<(String, String)> },
    AnswerCallback { callback_id: String },
    Document { filename: String },
}

/// Transport that records every call; placeholder ids count up from 100.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    next_message_id: AtomicI32,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            next_message_id: AtomicI32::new(100),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { text, .. } | Call::SendWithKeyboard { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Edit { text, .. } | Call::EditWithKeyboard { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn flatten(keyboard: &Keyboard) -> Vec<(String, String)> {
    keyboard
        .rows
        .iter()
        .flatten()
        .map(|b| (b.label.clone(), b.callback_data.clone()))
        .collect()
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.record(Call::Send {
            chat_id: chat.id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String> {
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.record(Call::Send {
            chat_id: chat.id,
            text: text.to_string(),
        });
        Ok(id.to_string())
    }

    async fn send_message_with_keyboard(
        &self,
        chat: &Chat,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<()> {
        self.record(Call::SendWithKeyboard {
            chat_id: chat.id,
            text: text.to_string(),
            buttons: flatten(keyboard),
        });
        Ok(())
    }

    async fn edit_message(&self, _chat: &Chat, message_id: &str, text: &str) -> Result<()> {
        self.record(Call::Edit {
            message_id: message_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn edit_message_with_keyboard(
        &self,
        _chat: &Chat,
        message_id: &str,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<()> {
        self.record(Call::EditWithKeyboard {
            message_id: message_id.to_string(),
            text: text.to_string(),
            buttons: flatten(keyboard),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.record(Call::AnswerCallback {
            callback_id: callback_id.to_string(),
        });
        Ok(())
    }

    async fn send_document(&self, _chat: &Chat, _path: &std::path::Path, filename: &str) -> Result<()> {
        self.record(Call::Document {
            filename: filename.to_string(),
        });
        Ok(())
    }
}

/// Backend that replays a fixed fragment script. An entry of `Err` aborts the
/// stream at that point.
pub struct ScriptedBackend {
    fragments: Vec<ProviderResult<String>>,
}

impl ScriptedBackend {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
        }
    }

    pub fn failing_after(fragments: &[&str], error: &str) -> Self {
        let mut script: Vec<ProviderResult<String>> =
            fragments.iter().map(|f| Ok(f.to_string())).collect();
        script.push(Err(ProviderError::Stream(error.to_string())));
        Self { fragments: script }
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _model: &str,
        _temperature: f32,
    ) -> ProviderResult<String> {
        let mut answer = String::new();
        for item in &self.fragments {
            match item {
                Ok(f) => answer.push_str(f),
                Err(_) => return Err(ProviderError::Stream("scripted failure".to_string())),
            }
        }
        Ok(answer)
    }

    async fn chat_stream(
        &self,
        _messages: &[ChatMessage],
        _model: &str,
        _temperature: f32,
    ) -> ProviderResult<FragmentStream> {
        let script: Vec<ProviderResult<String>> = self
            .fragments
            .iter()
            .map(|item| match item {
                Ok(f) => Ok(f.clone()),
                Err(_) => Err(ProviderError::Stream("scripted failure".to_string())),
            })
            .collect();
        Ok(Box::pin(stream::iter(script)))
    }
}

pub struct TestBot {
    pub ctx: BotContext,
    pub transport: Arc<MockTransport>,
    pub store: Arc<MemoryUserStore>,
}

/// A context over the in-memory store and the recording transport, with the
/// given backend script serving every model.
pub fn test_bot(backend: ScriptedBackend, maintenance_mode: bool) -> TestBot {
    let transport = MockTransport::new();
    let store = Arc::new(MemoryUserStore::new());
    let providers = ProviderService::new(store.clone()).with_backend(Arc::new(backend));
    let ctx = BotContext {
        transport: transport.clone(),
        store: store.clone(),
        providers: Arc::new(providers),
        locks: UserLocks::new(),
        relay: StreamRelay::new(Duration::from_secs(2)),
        default_access_level: bot_core::AccessLevel::User,
        default_model: "llama3.1".to_string(),
        maintenance_mode,
    };
    TestBot {
        ctx,
        transport,
        store,
    }
}
