//! Handlers available to regular users: onboarding, conversation reset,
//! model selection, bot state.

use bot_core::{find_model, models_available_to, Button, Keyboard};
use tracing::info;

use crate::error::BotResult;
use crate::router::{BotContext, Invocation};
use crate::strings;

pub async fn start(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    ctx.transport
        .send_message(&inv.chat, strings::MSG_WELCOME)
        .await?;
    Ok(())
}

pub async fn help(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    ctx.transport
        .send_message(&inv.chat, strings::MSG_HELP)
        .await?;
    Ok(())
}

pub async fn reset(ctx: &BotContext, mut inv: Invocation) -> BotResult<()> {
    inv.user.conversation.reset();
    ctx.store.save(&inv.user).await?;
    info!(user_id = inv.user.id, "Conversation reset");
    ctx.transport
        .send_message(&inv.chat, strings::MSG_RESET_DONE)
        .await?;
    Ok(())
}

/// Inline keyboard of the models the user's level allows, plus cancel.
pub async fn model_menu(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    let mut keyboard = Keyboard::new();
    for spec in models_available_to(inv.user.access_level) {
        keyboard = keyboard.row(Button::new(
            spec.name,
            format!("choose_model {}", spec.name),
        ));
    }
    keyboard = keyboard.row(Button::new(strings::BTN_CANCEL, "cancel"));
    ctx.transport
        .send_message_with_keyboard(&inv.chat, strings::MSG_CHOOSE_MODEL, &keyboard)
        .await?;
    Ok(())
}

pub async fn state(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    let model = ctx.providers.resolve(&inv.user).name;
    let text = strings::state_message(model, ctx.providers.stability_percentage());
    ctx.transport.send_message(&inv.chat, &text).await?;
    Ok(())
}

pub async fn cancel(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    inv.respond(ctx, strings::MSG_CANCELLED).await?;
    Ok(())
}

/// Sets `chosen_model` when the registry has the model, it is active, and the
/// user's level allows it.
pub async fn choose_model(ctx: &BotContext, mut inv: Invocation) -> BotResult<()> {
    let name = inv.args[1].clone();
    let allowed = find_model(&name)
        .filter(|spec| spec.active && spec.min_access_level <= inv.user.access_level);
    let Some(spec) = allowed else {
        inv.respond(ctx, strings::MSG_MODEL_UNAVAILABLE).await?;
        return Ok(());
    };

    inv.user.chosen_model = spec.name.to_string();
    ctx.store.save(&inv.user).await?;
    info!(user_id = inv.user.id, model = spec.name, "Model chosen");
    inv.respond(ctx, &strings::model_chosen(spec.name)).await?;
    Ok(())
}
