//! Binary entry point: load config, init tracing, build the store, backends,
//! and router, then run the teloxide dispatcher.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::dptree;
use teloxide::prelude::*;
use tracing::{error, info, warn};

use model_providers::{AggregatorBackend, OllamaBackend, OpenAiBackend, ProviderService};
use relay_bot::events::{Incoming, IncomingKind, Sender};
use relay_bot::router::{BotContext, Router};
use relay_bot::{Config, StreamRelay, TeloxideTransport, UserLocks};
use user_store::{MemoryUserStore, SqliteUserStore, UserStore};

#[derive(Parser, Debug)]
#[command(name = "relay-bot", about = "Telegram LLM relay bot")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "relay-bot.toml")]
    config: PathBuf,

    /// Keep users in memory instead of SQLite (nothing survives a restart).
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    config.validate()?;
    bot_core::init_tracing(&config.logging.file)?;
    info!(config = %cli.config.display(), "Starting relay bot");

    let store: Arc<dyn UserStore> = if cli.ephemeral {
        warn!("Running with the in-memory store; users are not persisted");
        Arc::new(MemoryUserStore::new())
    } else {
        Arc::new(
            SqliteUserStore::new(&config.storage.database_url)
                .await
                .context("Open user database")?,
        )
    };

    let mut providers = ProviderService::new(store.clone())
        .with_backend(Arc::new(OllamaBackend::new(
            config.providers.ollama_host.clone(),
        )));
    if !config.providers.openai_api_key.trim().is_empty() {
        let key = config.providers.openai_api_key.clone();
        let backend = match &config.providers.openai_api_base {
            Some(base) => OpenAiBackend::with_base_url(key, base.clone()),
            None => OpenAiBackend::new(key),
        };
        providers = providers.with_backend(Arc::new(backend));
    }
    if let Some(base) = &config.providers.aggregator_base {
        providers = providers.with_backend(Arc::new(AggregatorBackend::new(
            base.clone(),
            config.providers.aggregator_api_key.clone(),
        )));
    }

    let bot = Bot::new(config.telegram.token.clone());
    let ctx = Arc::new(BotContext {
        transport: Arc::new(TeloxideTransport::new(bot.clone())),
        store,
        providers: Arc::new(providers),
        locks: UserLocks::new(),
        relay: StreamRelay::from_secs(config.relay.edit_interval_secs),
        default_access_level: config.default_access_level()?,
        default_model: config.default_model_name(),
        maintenance_mode: config.access.maintenance_mode,
    });
    let router = Arc::new(Router::new());

    if config.access.maintenance_mode {
        warn!("Maintenance mode is on; only admins are served");
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_endpoint))
        .branch(Update::filter_callback_query().endpoint(callback_endpoint));

    info!("Dispatcher starting (long polling)");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx, router])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}

fn sender_from_user(user: &teloxide::types::User) -> Sender {
    Sender {
        id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        username: user.username.clone(),
        language_code: user.language_code.clone(),
    }
}

/// Splits `/command arg arg` into name (mention stripped) and args.
fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let mut tokens = text.split_whitespace();
    let head = tokens.next()?.strip_prefix('/')?;
    let name = head.split('@').next().unwrap_or(head).to_string();
    Some((name, tokens.map(String::from).collect()))
}

async fn message_endpoint(
    msg: Message,
    ctx: Arc<BotContext>,
    router: Arc<Router>,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        info!(chat_id = msg.chat.id.0, "Ignoring non-text message");
        return Ok(());
    };

    let kind = match parse_command(text) {
        Some((name, args)) => IncomingKind::Command { name, args },
        None => IncomingKind::Text(text.to_string()),
    };
    let incoming = Incoming {
        chat: bot_core::Chat { id: msg.chat.id.0 },
        sender: sender_from_user(from),
        kind,
    };

    // Dispatch in a spawned task so long turns do not stall polling.
    tokio::spawn(async move {
        if let Err(e) = router.dispatch(&ctx, incoming).await {
            error!(error = %e, "Dispatch failed");
        }
    });
    Ok(())
}

async fn callback_endpoint(
    bot: Bot,
    query: CallbackQuery,
    ctx: Arc<BotContext>,
    router: Arc<Router>,
) -> ResponseResult<()> {
    // Clear the client spinner before doing anything else.
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let Some(payload) = query.data.clone() else {
        return Ok(());
    };
    let Some(message) = query.message.as_ref() else {
        return Ok(());
    };
    let incoming = Incoming {
        chat: bot_core::Chat {
            id: message.chat().id.0,
        },
        sender: sender_from_user(&query.from),
        kind: IncomingKind::Callback {
            payload,
            message_id: Some(message.id().to_string()),
        },
    };

    tokio::spawn(async move {
        if let Err(e) = router.dispatch(&ctx, incoming).await {
            error!(error = %e, "Callback dispatch failed");
        }
    });
    Ok(())
}
