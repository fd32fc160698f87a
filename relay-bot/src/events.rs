//! Transport-independent inbound events. The teloxide layer converts raw
//! updates into these; the router only ever sees this shape.

use bot_core::Chat;

/// Who sent the event, as reported by the transport.
#[derive(Debug, Clone)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone)]
pub enum IncomingKind {
    /// A slash command: name without the slash, plus the tokens after it.
    Command { name: String, args: Vec<String> },
    /// Plain text, relayed to the model.
    Text(String),
    /// An inline-keyboard callback. `message_id` is the message carrying the
    /// keyboard, when the transport still knows it.
    Callback {
        payload: String,
        message_id: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Incoming {
    pub chat: Chat,
    pub sender: Sender,
    pub kind: IncomingKind,
}

/// Splits a command or callback payload into tokens. Colon-separated payloads
/// (`delete_user:ID42`) and space-separated ones are both accepted.
pub fn split_payload(payload: &str) -> Vec<String> {
    if payload.contains(':') {
        payload
            .split(':')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    } else {
        payload.split_whitespace().map(String::from).collect()
    }
}

/// Parses a user id token, with or without the `ID` display prefix.
pub fn parse_user_id(token: &str) -> Option<i64> {
    let digits = token.strip_prefix("ID").unwrap_or(token);
    digits.parse().ok()
}
