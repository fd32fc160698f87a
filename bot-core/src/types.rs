//! User record, chat identity, and keyboard types shared across crates.

use serde::{Deserialize, Serialize};

use crate::access::AccessLevel;
use crate::conversation::ConversationHistory;

/// The persisted per-user record. The store owns the canonical copy; handlers
/// work on a copy and must write back explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub access_level: AccessLevel,
    pub chosen_model: String,
    #[serde(default)]
    pub conversation: ConversationHistory,
}

impl UserRecord {
    /// Locale used for localized labels; defaults to English.
    pub fn locale(&self) -> &str {
        self.language_code.as_deref().unwrap_or("en")
    }

    /// One-line display form used in logs and the admin user list.
    pub fn display_line(&self) -> String {
        format!(
            "{} \"{}\" (ID{})",
            self.first_name,
            self.username.as_deref().unwrap_or("---"),
            self.id
        )
    }
}

/// Seed for lazily creating a record on first contact: display fields from
/// the transport plus configured defaults.
#[derive(Debug, Clone)]
pub struct UserSeed {
    pub first_name: String,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub access_level: AccessLevel,
    pub chosen_model: String,
}

impl UserSeed {
    pub fn into_record(self, id: i64) -> UserRecord {
        UserRecord {
            id,
            first_name: self.first_name,
            username: self.username,
            language_code: self.language_code,
            access_level: self.access_level,
            chosen_model: self.chosen_model,
            conversation: ConversationHistory::new(),
        }
    }
}

/// Chat (private or group) identity on the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// One inline button: a label and the callback payload it sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback_data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single-button row (the common layout in this bot).
    pub fn row(mut self, button: Button) -> Self {
        self.rows.push(vec![button]);
        self
    }
}
