//! Free-text handler: one streamed relay turn per message, serialized per
//! user so overlapping messages cannot interleave history writes.

use tracing::{info, warn};

use crate::error::BotResult;
use crate::router::{BotContext, Invocation};
use crate::strings;

pub async fn relay_turn(ctx: &BotContext, inv: Invocation) -> BotResult<()> {
    let Invocation {
        mut user,
        chat,
        text,
        ..
    } = inv;
    let _turn = ctx.locks.acquire(user.id).await;

    let placeholder = ctx
        .transport
        .send_message_and_return_id(&chat, strings::MSG_THINKING)
        .await?;

    let fragments = match ctx.providers.stream_answer(&text, &user).await {
        Ok(stream) => stream,
        Err(e) => {
            ctx.providers.record_stream_outcome(false);
            warn!(user_id = user.id, error = %e, "Failed to start answer stream");
            let notice = strings::answer_failed(ctx.providers.stability_percentage());
            ctx.transport
                .edit_message(&chat, &placeholder, &notice)
                .await?;
            return Ok(());
        }
    };

    match ctx
        .relay
        .run(
            ctx.transport.as_ref(),
            &chat,
            &placeholder,
            fragments,
            strings::MSG_EMPTY_RESPONSE,
        )
        .await
    {
        Ok(Some(answer)) => {
            ctx.providers.record_stream_outcome(true);
            ctx.providers.persist_turn(&mut user, &text, &answer).await?;
            info!(user_id = user.id, chars = answer.len(), "Turn completed");
        }
        Ok(None) => {
            // The backend answered, just with nothing. History stays as-is.
            ctx.providers.record_stream_outcome(true);
            info!(user_id = user.id, "Empty model response");
        }
        Err(e) => {
            ctx.providers.record_stream_outcome(false);
            warn!(user_id = user.id, error = %e, "Answer stream failed mid-turn");
            let notice = strings::answer_failed(ctx.providers.stability_percentage());
            ctx.transport.send_message(&chat, &notice).await?;
        }
    }
    Ok(())
}
