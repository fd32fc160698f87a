//! Admin handlers: user listing, the per-user card with its action keyboard,
//! deletion, the two-step access-level change, request forwarding, and the
//! JSON export.

use bot_core::{AccessLevel, Button, Keyboard, Role, UserRecord, ALL_LEVELS};
use tracing::info;
use user_store::StoreError;

use crate::error::BotResult;
use crate::events::parse_user_id;
use crate::export;
use crate::router::{BotContext, Invocation};
use crate::strings;

pub async fn users(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    let all = ctx.store.all().await?;
    let text = if all.is_empty() {
        strings::MSG_NO_USERS.to_string()
    } else {
        all.iter()
            .map(UserRecord::display_line)
            .collect::<Vec<_>>()
            .join("\n")
    };
    ctx.transport.send_message(&inv.chat, &text).await?;
    Ok(())
}

/// Looks a target user up by an `ID`-prefixed or bare numeric token. Replies
/// for the two expected failures and returns `None` so the caller just stops.
async fn lookup_target(
    ctx: &BotContext,
    inv: &Invocation,
    token: &str,
) -> BotResult<Option<UserRecord>> {
    let Some(id) = parse_user_id(token) else {
        inv.respond(ctx, strings::MSG_BAD_USER_ID).await?;
        return Ok(None);
    };
    match ctx.store.get(id).await {
        Ok(user) => Ok(Some(user)),
        Err(StoreError::NotFound(_)) => {
            inv.respond(ctx, &strings::user_not_found(id)).await?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn user_card(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    let Some(target) = lookup_target(ctx, &inv, &inv.args[1]).await? else {
        return Ok(());
    };

    let card = strings::user_card(
        target.id,
        &target.first_name,
        target.access_level.label(inv.user.locale()),
        target.conversation.user_turns(),
    );
    let keyboard = Keyboard::new()
        .row(Button::new(
            strings::BTN_DELETE_USER,
            format!("delete_user ID{}", target.id),
        ))
        .row(Button::new(
            strings::BTN_CHANGE_LEVEL,
            format!("change_access_level ID{}", target.id),
        ))
        .row(Button::new(
            strings::BTN_FORWARD_REQUESTS,
            format!("forward_requests ID{}", target.id),
        ))
        .row(Button::new(strings::BTN_CANCEL, "cancel"));
    ctx.transport
        .send_message_with_keyboard(&inv.chat, &card, &keyboard)
        .await?;
    Ok(())
}

pub async fn dump(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    let all = ctx.store.all().await?;
    export::send_users_dump(ctx.transport.as_ref(), &inv.chat, &all).await?;
    info!(admin_id = inv.user.id, users = all.len(), "Users exported");
    Ok(())
}

pub async fn delete_user(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    let Some(id) = parse_user_id(&inv.args[1]) else {
        inv.respond(ctx, strings::MSG_BAD_USER_ID).await?;
        return Ok(());
    };
    let existed = ctx.store.delete(id).await?;
    let text = if existed {
        info!(admin_id = inv.user.id, target_id = id, "User deleted");
        strings::user_deleted(id)
    } else {
        strings::user_not_found(id)
    };
    inv.respond(ctx, &text).await?;
    Ok(())
}

/// Step one of the level change: show every level as a button; the chosen one
/// comes back as `change_access_level_confirm`.
pub async fn change_access_level(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    let Some(target) = lookup_target(ctx, &inv, &inv.args[1]).await? else {
        return Ok(());
    };

    let mut keyboard = Keyboard::new();
    for level in ALL_LEVELS {
        keyboard = keyboard.row(Button::new(
            level.label(inv.user.locale()),
            format!(
                "change_access_level_confirm ID{} {}",
                target.id,
                level.rank()
            ),
        ));
    }
    keyboard = keyboard.row(Button::new(strings::BTN_CANCEL, "cancel"));
    inv.respond_with_keyboard(ctx, strings::MSG_CHOOSE_LEVEL, &keyboard)
        .await?;
    Ok(())
}

pub async fn change_access_level_confirm(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    let Some(mut target) = lookup_target(ctx, &inv, &inv.args[1]).await? else {
        return Ok(());
    };
    let Some(raw) = inv.args[2].parse::<i64>().ok() else {
        inv.respond(ctx, strings::MSG_WRONG_ARGS).await?;
        return Ok(());
    };
    let level = AccessLevel::from_raw(raw)?;

    target.access_level = level;
    ctx.store.save(&target).await?;
    info!(
        admin_id = inv.user.id,
        target_id = target.id,
        level = level.rank(),
        "Access level changed"
    );
    inv.respond(
        ctx,
        &strings::level_changed(target.id, level.label(inv.user.locale())),
    )
    .await?;
    Ok(())
}

/// Re-sends the target user's requests (their user-role messages) into the
/// admin's chat.
pub async fn forward_requests(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    let Some(target) = lookup_target(ctx, &inv, &inv.args[1]).await? else {
        return Ok(());
    };

    let requests: Vec<&str> = target
        .conversation
        .messages()
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect();
    if requests.is_empty() {
        inv.respond(ctx, strings::MSG_NO_REQUESTS).await?;
        return Ok(());
    }
    for request in &requests {
        ctx.transport.send_message(&inv.chat, request).await?;
    }
    inv.respond(ctx, &strings::forwarded_requests(requests.len()))
        .await?;
    Ok(())
}
