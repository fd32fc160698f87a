//! Facade over the configured backends: resolves a user's chosen model,
//! dispatches to the right backend, keeps the stability counters, and
//! persists completed conversation turns.

use std::collections::HashMap;
use std::sync::Arc;

use bot_core::{default_model, find_model, BackendKind, ChatMessage, ModelSpec, UserRecord};
use tracing::{info, warn};
use user_store::UserStore;

use crate::counters::ResponseCounters;
use crate::error::{ProviderError, ProviderResult};
use crate::{FragmentStream, ModelBackend};

pub struct ProviderService {
    backends: HashMap<BackendKind, Arc<dyn ModelBackend>>,
    store: Arc<dyn UserStore>,
    counters: ResponseCounters,
}

impl ProviderService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            backends: HashMap::new(),
            store,
            counters: ResponseCounters::new(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    /// Model spec for the user's chosen model, falling back to the default
    /// when the stored name no longer exists in the registry.
    pub fn resolve(&self, user: &UserRecord) -> &'static ModelSpec {
        match find_model(&user.chosen_model) {
            Some(spec) => spec,
            None => {
                warn!(
                    user_id = user.id,
                    model = %user.chosen_model,
                    "Unknown chosen model, using default"
                );
                default_model()
            }
        }
    }

    fn backend_for(&self, spec: &ModelSpec) -> ProviderResult<&Arc<dyn ModelBackend>> {
        self.backends
            .get(&spec.backend)
            .ok_or(ProviderError::BackendUnavailable(spec.backend))
    }

    /// Complete one batch turn: call the backend, append the user and
    /// assistant messages to the conversation, and persist. Nothing is
    /// persisted when the backend fails.
    pub async fn create_answer(
        &self,
        message: &str,
        user: &mut UserRecord,
    ) -> ProviderResult<String> {
        let spec = self.resolve(user);
        let backend = self.backend_for(spec)?;
        let context = user.conversation.with_user_message(message);

        self.counters.note_request();
        let answer = backend.chat(&context, spec.name, spec.temperature).await?;
        let answer = answer.trim().to_string();
        self.counters.note_success();
        info!(user_id = user.id, model = spec.name, "Model answer received");

        user.conversation.push(ChatMessage::user(message));
        user.conversation.push(ChatMessage::assistant(&answer));
        self.store
            .save(user)
            .await
            .map_err(|e| ProviderError::Store(e.to_string()))?;
        Ok(answer)
    }

    /// Hand out a fragment stream for one turn. The request counter is bumped
    /// here; the caller reports the outcome via [`record_stream_outcome`]
    /// once the stream has been fully consumed, and persists the turn itself.
    ///
    /// [`record_stream_outcome`]: ProviderService::record_stream_outcome
    pub async fn stream_answer(
        &self,
        message: &str,
        user: &UserRecord,
    ) -> ProviderResult<FragmentStream> {
        let spec = self.resolve(user);
        let backend = self.backend_for(spec)?;
        let context = user.conversation.with_user_message(message);

        self.counters.note_request();
        backend
            .chat_stream(&context, spec.name, spec.temperature)
            .await
    }

    pub fn record_stream_outcome(&self, success: bool) {
        if success {
            self.counters.note_success();
        }
    }

    /// Append a completed streamed turn to the conversation and persist.
    pub async fn persist_turn(
        &self,
        user: &mut UserRecord,
        message: &str,
        answer: &str,
    ) -> ProviderResult<()> {
        user.conversation.push(ChatMessage::user(message));
        user.conversation.push(ChatMessage::assistant(answer));
        self.store
            .save(user)
            .await
            .map_err(|e| ProviderError::Store(e.to_string()))
    }

    pub fn stability_percentage(&self) -> f64 {
        self.counters.stability_percentage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use bot_core::{ChatMessage, UserSeed};
    use futures::{stream, StreamExt};
    use std::sync::atomic::{AtomicBool, Ordering};
    use user_store::MemoryUserStore;

    struct FakeBackend {
        kind: BackendKind,
        answer: String,
        fail: AtomicBool,
    }

    impl FakeBackend {
        fn new(kind: BackendKind, answer: &str) -> Self {
            Self {
                kind,
                answer: answer.to_string(),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl ModelBackend for FakeBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _model: &str,
            _temperature: f32,
        ) -> ProviderResult<String> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError::Api("backend down".to_string()));
            }
            Ok(self.answer.clone())
        }

        async fn chat_stream(
            &self,
            _messages: &[ChatMessage],
            _model: &str,
            _temperature: f32,
        ) -> ProviderResult<FragmentStream> {
            let chunks: Vec<ProviderResult<String>> = self
                .answer
                .split_inclusive(' ')
                .map(|s| Ok(s.to_string()))
                .collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    fn seeded_user(chosen_model: &str) -> UserRecord {
        let mut user = UserSeed {
            first_name: "Test".to_string(),
            username: None,
            language_code: Some("en".to_string()),
            access_level: bot_core::AccessLevel::User,
            chosen_model: chosen_model.to_string(),
        }
        .into_record(42);
        user.chosen_model = chosen_model.to_string();
        user
    }

    fn service_with(backend: FakeBackend) -> (ProviderService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let service = ProviderService::new(store.clone()).with_backend(Arc::new(backend));
        (service, store)
    }

    #[tokio::test]
    async fn create_answer_persists_both_turns() {
        let (service, store) =
            service_with(FakeBackend::new(BackendKind::Ollama, "  hello there  "));
        let mut user = seeded_user("llama3.1");
        store.save(&user).await.unwrap();

        let answer = service.create_answer("hi", &mut user).await.unwrap();
        assert_eq!(answer, "hello there");

        let stored = store.get(42).await.unwrap();
        assert_eq!(stored.conversation.len(), 2);
        assert_eq!(stored.conversation.messages()[1].content, "hello there");
        assert_eq!(service.stability_percentage(), 100.0);
    }

    #[tokio::test]
    async fn failed_answer_leaves_conversation_untouched() {
        let backend = FakeBackend::new(BackendKind::Ollama, "unused");
        backend.fail.store(true, Ordering::SeqCst);
        let (service, store) = service_with(backend);
        let mut user = seeded_user("llama3.1");
        store.save(&user).await.unwrap();

        let result = service.create_answer("hi", &mut user).await;
        assert!(result.is_err());
        assert!(store.get(42).await.unwrap().conversation.is_empty());
        assert_eq!(service.stability_percentage(), 0.0);
    }

    #[tokio::test]
    async fn unknown_model_falls_back_to_default() {
        let (service, _store) = service_with(FakeBackend::new(BackendKind::Ollama, "ok"));
        let user = seeded_user("deleted-model");
        assert_eq!(service.resolve(&user).name, default_model().name);
    }

    #[tokio::test]
    async fn missing_backend_is_reported() {
        let (service, _store) = service_with(FakeBackend::new(BackendKind::Ollama, "ok"));
        let mut user = seeded_user("gpt-4o");
        let err = service.create_answer("hi", &mut user).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::BackendUnavailable(BackendKind::OpenAi)
        ));
    }

    #[tokio::test]
    async fn stream_outcome_drives_stability() {
        let (service, _store) = service_with(FakeBackend::new(BackendKind::Ollama, "one two"));
        let user = seeded_user("llama3.1");

        let mut fragments = service.stream_answer("hi", &user).await.unwrap();
        let mut collected = String::new();
        while let Some(fragment) = fragments.next().await {
            collected.push_str(&fragment.unwrap());
        }
        assert_eq!(collected, "one two");

        assert_eq!(service.stability_percentage(), 0.0);
        service.record_stream_outcome(true);
        assert_eq!(service.stability_percentage(), 100.0);
    }
}
