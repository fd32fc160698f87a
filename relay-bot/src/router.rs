//! Command router: one table of routes, one staged dispatch pipeline.
//!
//! Every inbound event runs `authorize` → `validate_args` → handler, with the
//! router inspecting each stage's outcome. Confirmation callbacks deny
//! silently so a revoked admin does not get spammed per button press.

use std::collections::HashMap;
use std::sync::Arc;

use bot_core::{AccessLevel, Chat, Transport, UserRecord, UserSeed};
use model_providers::ProviderService;
use tracing::{error, info, warn};
use user_store::UserStore;

use crate::events::{split_payload, Incoming, IncomingKind};
use crate::locks::UserLocks;
use crate::relay::StreamRelay;
use crate::{handlers, strings};

/// Everything a handler needs, shared across all dispatches.
pub struct BotContext {
    pub transport: Arc<dyn Transport>,
    pub store: Arc<dyn UserStore>,
    pub providers: Arc<ProviderService>,
    pub locks: UserLocks,
    pub relay: StreamRelay,
    pub default_access_level: AccessLevel,
    pub default_model: String,
    pub maintenance_mode: bool,
}

/// One resolved dispatch: the acting user plus the parsed event pieces.
pub struct Invocation {
    pub user: UserRecord,
    pub chat: Chat,
    /// Positional tokens including the command token itself.
    pub args: Vec<String>,
    /// Free text for the relay handler; empty otherwise.
    pub text: String,
    /// Message carrying the inline keyboard, for callback edits.
    pub callback_message_id: Option<String>,
}

impl Invocation {
    /// Edits the originating keyboard message when there is one, otherwise
    /// sends a fresh message. Callback handlers reply through this.
    pub async fn respond(&self, ctx: &BotContext, text: &str) -> bot_core::Result<()> {
        match &self.callback_message_id {
            Some(id) => ctx.transport.edit_message(&self.chat, id, text).await,
            None => ctx.transport.send_message(&self.chat, text).await,
        }
    }

    /// Same as [`respond`](Self::respond), with an inline keyboard attached.
    pub async fn respond_with_keyboard(
        &self,
        ctx: &BotContext,
        text: &str,
        keyboard: &bot_core::Keyboard,
    ) -> bot_core::Result<()> {
        match &self.callback_message_id {
            Some(id) => {
                ctx.transport
                    .edit_message_with_keyboard(&self.chat, id, text, keyboard)
                    .await
            }
            None => {
                ctx.transport
                    .send_message_with_keyboard(&self.chat, text, keyboard)
                    .await
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    fn matches(self, got: usize) -> bool {
        match self {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted,
    DeniedMaintenance,
    DeniedLevel,
}

/// Grant iff `(!maintenance || level >= Admin) && level >= minimum`.
pub fn authorize(level: AccessLevel, minimum: AccessLevel, maintenance: bool) -> AuthOutcome {
    if maintenance && level < AccessLevel::Admin {
        return AuthOutcome::DeniedMaintenance;
    }
    if level < minimum {
        return AuthOutcome::DeniedLevel;
    }
    AuthOutcome::Granted
}

/// What a route does once its stages pass. Closed set; dispatch matches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Help,
    Reset,
    Model,
    State,
    Users,
    UserCard,
    Dump,
    Relay,
    Cancel,
    ChooseModel,
    DeleteUser,
    ChangeAccessLevel,
    ChangeAccessLevelConfirm,
    ForwardRequests,
}

struct Route {
    minimum: AccessLevel,
    /// Verbose routes tell the user why they were denied; silent ones do not.
    verbose: bool,
    arity: Arity,
    action: Action,
}

impl Route {
    fn verbose(minimum: AccessLevel, arity: Arity, action: Action) -> Self {
        Self {
            minimum,
            verbose: true,
            arity,
            action,
        }
    }

    fn silent(minimum: AccessLevel, arity: Arity, action: Action) -> Self {
        Self {
            minimum,
            verbose: false,
            arity,
            action,
        }
    }
}

pub struct Router {
    commands: HashMap<&'static str, Route>,
    callbacks: HashMap<&'static str, Route>,
    text_route: Route,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        use AccessLevel::{Admin, Guest, User};
        use Arity::{AtLeast, Exact};

        let mut commands = HashMap::new();
        commands.insert("start", Route::verbose(Guest, AtLeast(1), Action::Start));
        commands.insert("help", Route::verbose(Guest, AtLeast(1), Action::Help));
        commands.insert("reset", Route::verbose(User, Exact(1), Action::Reset));
        commands.insert("model", Route::verbose(User, Exact(1), Action::Model));
        commands.insert("state", Route::verbose(User, Exact(1), Action::State));
        commands.insert("users", Route::verbose(Admin, Exact(1), Action::Users));
        commands.insert("user", Route::verbose(Admin, Exact(2), Action::UserCard));
        commands.insert("dump", Route::verbose(Admin, Exact(1), Action::Dump));

        let mut callbacks = HashMap::new();
        callbacks.insert("cancel", Route::verbose(User, Exact(1), Action::Cancel));
        callbacks.insert(
            "choose_model",
            Route::verbose(User, Exact(2), Action::ChooseModel),
        );
        callbacks.insert(
            "delete_user",
            Route::silent(Admin, Exact(2), Action::DeleteUser),
        );
        callbacks.insert(
            "change_access_level",
            Route::silent(Admin, Exact(2), Action::ChangeAccessLevel),
        );
        callbacks.insert(
            "change_access_level_confirm",
            Route::silent(Admin, Exact(3), Action::ChangeAccessLevelConfirm),
        );
        callbacks.insert(
            "forward_requests",
            Route::silent(Admin, Exact(2), Action::ForwardRequests),
        );

        Self {
            commands,
            callbacks,
            text_route: Route::verbose(User, AtLeast(0), Action::Relay),
        }
    }

    /// Runs the full pipeline for one inbound event.
    pub async fn dispatch(&self, ctx: &BotContext, incoming: Incoming) -> anyhow::Result<()> {
        let seed = UserSeed {
            first_name: incoming.sender.first_name.clone(),
            username: incoming.sender.username.clone(),
            language_code: incoming.sender.language_code.clone(),
            access_level: ctx.default_access_level,
            chosen_model: ctx.default_model.clone(),
        };
        let user = ctx.store.get_or_create(incoming.sender.id, &seed).await?;

        let (route, invocation) = match incoming.kind {
            IncomingKind::Command { name, args } => {
                let Some(route) = self.commands.get(name.as_str()) else {
                    info!(user_id = user.id, command = %name, "Unknown command");
                    ctx.transport
                        .send_message(&incoming.chat, strings::MSG_UNKNOWN_COMMAND)
                        .await?;
                    return Ok(());
                };
                let mut tokens = vec![name];
                tokens.extend(args);
                (
                    route,
                    Invocation {
                        user,
                        chat: incoming.chat,
                        args: tokens,
                        text: String::new(),
                        callback_message_id: None,
                    },
                )
            }
            IncomingKind::Text(text) => (
                &self.text_route,
                Invocation {
                    user,
                    chat: incoming.chat,
                    args: Vec::new(),
                    text,
                    callback_message_id: None,
                },
            ),
            IncomingKind::Callback {
                payload,
                message_id,
            } => {
                let tokens = split_payload(&payload);
                let Some(route) = tokens
                    .first()
                    .and_then(|head| self.callbacks.get(head.as_str()))
                else {
                    warn!(user_id = user.id, payload = %payload, "Unknown callback payload");
                    return Ok(());
                };
                (
                    route,
                    Invocation {
                        user,
                        chat: incoming.chat,
                        args: tokens,
                        text: String::new(),
                        callback_message_id: message_id,
                    },
                )
            }
        };

        // Stage 1: authorization.
        match authorize(
            invocation.user.access_level,
            route.minimum,
            ctx.maintenance_mode,
        ) {
            AuthOutcome::Granted => {}
            AuthOutcome::DeniedMaintenance => {
                info!(user_id = invocation.user.id, "Denied: maintenance mode");
                if route.verbose {
                    invocation.respond(ctx, strings::MSG_MAINTENANCE).await?;
                }
                return Ok(());
            }
            AuthOutcome::DeniedLevel => {
                info!(
                    user_id = invocation.user.id,
                    level = invocation.user.access_level.rank(),
                    required = route.minimum.rank(),
                    "Denied: insufficient access level"
                );
                if route.verbose {
                    invocation.respond(ctx, strings::MSG_NO_ACCESS).await?;
                }
                return Ok(());
            }
        }

        // Stage 2: argument count (the command token counts).
        if !route.arity.matches(invocation.args.len()) {
            warn!(
                user_id = invocation.user.id,
                got = invocation.args.len(),
                "Argument count mismatch"
            );
            invocation.respond(ctx, strings::MSG_WRONG_ARGS).await?;
            return Ok(());
        }

        // Stage 3: the handler. Errors become a user-facing reply, never a
        // dispatcher crash.
        let user_id = invocation.user.id;
        let chat = invocation.chat.clone();
        let result = match route.action {
            Action::Start => handlers::general::start(ctx, invocation).await,
            Action::Help => handlers::general::help(ctx, invocation).await,
            Action::Reset => handlers::general::reset(ctx, invocation).await,
            Action::Model => handlers::general::model_menu(ctx, invocation).await,
            Action::State => handlers::general::state(ctx, invocation).await,
            Action::Cancel => handlers::general::cancel(ctx, invocation).await,
            Action::ChooseModel => handlers::general::choose_model(ctx, invocation).await,
            Action::Relay => handlers::chat::relay_turn(ctx, invocation).await,
            Action::Users => handlers::admin::users(ctx, invocation).await,
            Action::UserCard => handlers::admin::user_card(ctx, invocation).await,
            Action::Dump => handlers::admin::dump(ctx, invocation).await,
            Action::DeleteUser => handlers::admin::delete_user(ctx, invocation).await,
            Action::ChangeAccessLevel => handlers::admin::change_access_level(ctx, invocation).await,
            Action::ChangeAccessLevelConfirm => {
                handlers::admin::change_access_level_confirm(ctx, invocation).await
            }
            Action::ForwardRequests => handlers::admin::forward_requests(ctx, invocation).await,
        };

        if let Err(e) = result {
            error!(user_id, error = %e, "Handler failed");
            let notice = strings::answer_failed(ctx.providers.stability_percentage());
            if let Err(send_err) = ctx.transport.send_message(&chat, &notice).await {
                error!(user_id, error = %send_err, "Failed to send failure notice");
            }
        }
        Ok(())
    }
}
