//! Stream relay: folds a fragment stream into one chat message by editing a
//! placeholder in place, rate-limited so the transport API is not hammered.

use std::time::Duration;

use bot_core::{Chat, Transport};
use futures::StreamExt;
use model_providers::{FragmentStream, ProviderError};
use tokio::time::Instant;
use tracing::{debug, warn};

/// True when the transport reports that the edited text equals the current
/// text. Telegram phrases this as "message is not modified"; it is a no-op,
/// not a failure.
pub fn is_message_not_modified_error(error: &str) -> bool {
    error.contains("message is not modified") || error.contains("exactly the same")
}

/// Drives one streamed answer into one message.
///
/// Fragments are concatenated in arrival order into `full_text`. An edit is
/// attempted when the accumulated text differs from what is displayed
/// (trimmed comparison) and the rate-limit window has passed; at stream end
/// one final edit runs regardless of the window. Edit failures are logged and
/// non-fatal; a fragment error aborts and leaves the last flushed text.
pub struct StreamRelay {
    interval: Duration,
}

impl StreamRelay {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Consumes the stream, editing `message_id` in `chat` as text arrives.
    ///
    /// Returns the trimmed final answer, or `None` when the stream produced
    /// no text (the placeholder is replaced with `empty_notice`). The caller
    /// persists the turn; this function never touches the store.
    pub async fn run(
        &self,
        transport: &dyn Transport,
        chat: &Chat,
        message_id: &str,
        mut fragments: FragmentStream,
        empty_notice: &str,
    ) -> Result<Option<String>, ProviderError> {
        let mut full_text = String::new();
        let mut last_flushed = String::new();
        let mut next_flush_at = Instant::now();

        while let Some(item) = fragments.next().await {
            let fragment = item?;
            full_text.push_str(&fragment);

            if full_text.trim() == last_flushed.trim() {
                continue;
            }
            if Instant::now() < next_flush_at {
                continue;
            }
            if self.flush(transport, chat, message_id, &full_text).await {
                last_flushed.clone_from(&full_text);
                next_flush_at = Instant::now() + self.interval;
            }
        }

        let answer = full_text.trim().to_string();
        if answer.is_empty() {
            self.flush(transport, chat, message_id, empty_notice).await;
            return Ok(None);
        }
        if answer != last_flushed.trim() {
            self.flush(transport, chat, message_id, &full_text).await;
        }
        Ok(Some(answer))
    }

    /// One edit attempt. Returns true when the displayed text now matches
    /// `text`, counting "not modified" as a match.
    async fn flush(
        &self,
        transport: &dyn Transport,
        chat: &Chat,
        message_id: &str,
        text: &str,
    ) -> bool {
        match transport.edit_message(chat, message_id, text).await {
            Ok(()) => true,
            Err(e) => {
                let description = e.to_string();
                if is_message_not_modified_error(&description) {
                    debug!(chat_id = chat.id, "Edit skipped, message unchanged");
                    true
                } else {
                    warn!(chat_id = chat.id, error = %description, "Failed to edit streamed message");
                    false
                }
            }
        }
    }
}
