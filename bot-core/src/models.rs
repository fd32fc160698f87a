//! Static model registry: which models exist, who may select them, and which
//! backend serves them.

use serde::{Deserialize, Serialize};

use crate::access::AccessLevel;

/// Which backend family serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    OpenAi,
    Ollama,
    Aggregator,
}

/// Descriptor for a selectable model. Registry data, not user-owned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub min_access_level: AccessLevel,
    pub temperature: f32,
    pub active: bool,
    pub backend: BackendKind,
}

impl ModelSpec {
    const fn new(
        name: &'static str,
        min_access_level: AccessLevel,
        backend: BackendKind,
        active: bool,
    ) -> Self {
        Self {
            name,
            min_access_level,
            temperature: 1.0,
            active,
            backend,
        }
    }
}

/// Every model the bot knows about. The first active entry is the default
/// offered to new users.
pub const MODEL_REGISTRY: &[ModelSpec] = &[
    ModelSpec::new("llama3.1", AccessLevel::User, BackendKind::Ollama, true),
    ModelSpec::new(
        "llama2-uncensored",
        AccessLevel::User,
        BackendKind::Ollama,
        true,
    ),
    ModelSpec::new("llama3", AccessLevel::User, BackendKind::Ollama, false),
    ModelSpec::new(
        "llava",
        AccessLevel::PrivilegedUser,
        BackendKind::Ollama,
        false,
    ),
    ModelSpec::new("gpt-3.5-turbo", AccessLevel::User, BackendKind::OpenAi, true),
    ModelSpec::new(
        "gpt-4o",
        AccessLevel::PrivilegedUser,
        BackendKind::OpenAi,
        true,
    ),
    ModelSpec::new(
        "gpt-3.5-turbo-free",
        AccessLevel::Guest,
        BackendKind::Aggregator,
        false,
    ),
];

/// All active models.
pub fn active_models() -> impl Iterator<Item = &'static ModelSpec> {
    MODEL_REGISTRY.iter().filter(|m| m.active)
}

/// Looks a model up by exact name, active or not.
pub fn find_model(name: &str) -> Option<&'static ModelSpec> {
    MODEL_REGISTRY.iter().find(|m| m.name == name)
}

/// Active models the given level is allowed to select.
pub fn models_available_to(level: AccessLevel) -> Vec<&'static ModelSpec> {
    active_models()
        .filter(|m| m.min_access_level <= level)
        .collect()
}

/// The model assigned to newly created users.
pub fn default_model() -> &'static ModelSpec {
    active_models()
        .next()
        .unwrap_or(&MODEL_REGISTRY[0])
}
