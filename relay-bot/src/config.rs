//! Config: a TOML file plus environment overrides for secrets. Loaded once at
//! startup; `validate()` fails fast before anything connects.

use std::path::Path;

use anyhow::{bail, Context, Result};
use bot_core::{default_model, find_model, AccessLevel, BackendKind};
use serde::Deserialize;

const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub providers: ProvidersConfig,
    pub access: AccessConfig,
    pub storage: StorageConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai_api_key: String,
    pub openai_api_base: Option<String>,
    pub ollama_host: String,
    pub aggregator_base: Option<String>,
    pub aggregator_api_key: Option<String>,
    /// Model assigned to new users; registry default when unset.
    pub default_model: Option<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_api_base: None,
            ollama_host: model_providers::ollama::DEFAULT_OLLAMA_HOST.to_string(),
            aggregator_base: None,
            aggregator_api_key: None,
            default_model: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub default_access_level: i64,
    pub maintenance_mode: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            default_access_level: AccessLevel::User.rank(),
            maintenance_mode: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "relay-bot.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Min interval (sec) between message edits when streaming; limits
    /// Telegram API rate.
    pub edit_interval_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            edit_interval_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/relay-bot.log".to_string(),
        }
    }
}

impl Config {
    /// Loads the TOML file (missing file means all defaults), then applies
    /// environment overrides. Secrets from the environment win over the file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Read config {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("Parse config {}", path.display()))?
        } else {
            Config::default()
        };

        if let Some(token) = non_empty_env(ENV_TELEGRAM_TOKEN) {
            config.telegram.token = token;
        }
        if let Some(key) = non_empty_env(ENV_OPENAI_API_KEY) {
            config.providers.openai_api_key = key;
        }
        Ok(config)
    }

    /// Fail-fast checks before any connection is opened.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.trim().is_empty() {
            bail!(
                "Telegram bot token is empty; set [telegram].token or {}",
                ENV_TELEGRAM_TOKEN
            );
        }
        if self.openai_required() && self.providers.openai_api_key.trim().is_empty() {
            bail!(
                "OpenAI API key is empty but the registry has active OpenAI models; set [providers].openai_api_key or {}",
                ENV_OPENAI_API_KEY
            );
        }
        if self.access.default_access_level >= AccessLevel::Admin.rank() {
            bail!(
                "default_access_level {} would make every new user an admin",
                self.access.default_access_level
            );
        }
        if let Some(name) = &self.providers.default_model {
            match find_model(name) {
                Some(spec) if spec.active => {}
                Some(_) => bail!("default_model {} is inactive", name),
                None => bail!("default_model {} is not in the registry", name),
            }
        }
        Ok(())
    }

    fn openai_required(&self) -> bool {
        bot_core::active_models().any(|m| m.backend == BackendKind::OpenAi)
    }

    pub fn default_access_level(&self) -> Result<AccessLevel> {
        AccessLevel::from_raw(self.access.default_access_level).map_err(Into::into)
    }

    pub fn default_model_name(&self) -> String {
        self.providers
            .default_model
            .clone()
            .unwrap_or_else(|| default_model().name.to_string())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
