//! Access levels: a fixed ordered scale gating commands and model selection.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Ordinal permission rank. Comparisons are numeric (`>=` gates access).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum AccessLevel {
    Guest,
    User,
    PrivilegedUser,
    Moderator,
    Admin,
}

/// All levels in ascending order. Fixed; new levels are added here, never discovered.
pub const ALL_LEVELS: [AccessLevel; 5] = [
    AccessLevel::Guest,
    AccessLevel::User,
    AccessLevel::PrivilegedUser,
    AccessLevel::Moderator,
    AccessLevel::Admin,
];

impl AccessLevel {
    pub const fn rank(self) -> i64 {
        match self {
            AccessLevel::Guest => 0,
            AccessLevel::User => 1,
            AccessLevel::PrivilegedUser => 2,
            AccessLevel::Moderator => 3,
            AccessLevel::Admin => 4,
        }
    }

    /// Converts a stored integer rank to a level.
    ///
    /// Values below [`AccessLevel::Guest`] clamp to Guest and values above
    /// [`AccessLevel::Admin`] clamp to Admin; an integer strictly between two
    /// defined ranks is rejected. The scale is contiguous, so the error arm
    /// only fires if a gap is ever introduced.
    pub fn from_raw(raw: i64) -> Result<Self> {
        match raw {
            r if r <= 0 => Ok(AccessLevel::Guest),
            1 => Ok(AccessLevel::User),
            2 => Ok(AccessLevel::PrivilegedUser),
            3 => Ok(AccessLevel::Moderator),
            r if r >= 4 => Ok(AccessLevel::Admin),
            r => Err(CoreError::InvalidAccessLevel(r)),
        }
    }

    /// Localized display name. Unknown locales fall back to English.
    pub fn label(self, locale: &str) -> &'static str {
        match locale {
            "ru" => match self {
                AccessLevel::Guest => "Гость",
                AccessLevel::User => "Пользователь",
                AccessLevel::PrivilegedUser => "Привилегированный пользователь",
                AccessLevel::Moderator => "Модератор",
                AccessLevel::Admin => "Администратор",
            },
            _ => match self {
                AccessLevel::Guest => "Guest",
                AccessLevel::User => "User",
                AccessLevel::PrivilegedUser => "Privileged user",
                AccessLevel::Moderator => "Moderator",
                AccessLevel::Admin => "Admin",
            },
        }
    }

    /// Display label for a raw stored rank, clamped at both ends.
    pub fn label_for_raw(raw: i64, locale: &str) -> Result<&'static str> {
        Ok(Self::from_raw(raw)?.label(locale))
    }
}

impl From<AccessLevel> for i64 {
    fn from(level: AccessLevel) -> Self {
        level.rank()
    }
}

impl TryFrom<i64> for AccessLevel {
    type Error = CoreError;

    fn try_from(raw: i64) -> Result<Self> {
        Self::from_raw(raw)
    }
}
