//! Admin JSON export: all user records pretty-printed to a temp file and
//! sent as a document. The file is removed whether sending worked or not.

use bot_core::{Chat, ConversationHistory, CoreError, Transport, UserRecord};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::error::BotResult;

#[derive(Serialize)]
struct UserDump<'a> {
    id: i64,
    first_name: &'a str,
    username: Option<&'a str>,
    language_code: Option<&'a str>,
    access_level: i64,
    access_level_label: &'static str,
    chosen_model: &'a str,
    conversation: &'a ConversationHistory,
}

/// JSON body of the export. Split out so the shape is testable without a
/// transport.
pub fn render_dump(users: &[UserRecord]) -> BotResult<String> {
    let dump: Vec<UserDump<'_>> = users
        .iter()
        .map(|u| UserDump {
            id: u.id,
            first_name: &u.first_name,
            username: u.username.as_deref(),
            language_code: u.language_code.as_deref(),
            access_level: u.access_level.rank(),
            access_level_label: u.access_level.label("en"),
            chosen_model: &u.chosen_model,
            conversation: &u.conversation,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&dump).map_err(CoreError::Serialization)?)
}

pub async fn send_users_dump(
    transport: &dyn Transport,
    chat: &Chat,
    users: &[UserRecord],
) -> BotResult<()> {
    let json = render_dump(users)?;
    let filename = format!("users-{}.json", Utc::now().format("%Y%m%d-%H%M%S"));
    let path = std::env::temp_dir().join(&filename);

    tokio::fs::write(&path, json).await.map_err(CoreError::Io)?;
    let sent = transport.send_document(chat, &path, &filename).await;
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove export temp file");
    }
    sent?;
    Ok(())
}
