//! Response validation and status translation.
//!
//! The review API answers with an untyped JSON document. This module checks
//! its shape, picks the most recent homework record, and turns that record
//! into the human-readable message that is sent to the chat.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HwbotError, Result};

/// Key holding the list of homework records in an API response.
const HOMEWORKS_KEY: &str = "homeworks";

/// Key holding the server timestamp of an API response.
const CURRENT_DATE_KEY: &str = "current_date";

/// Key holding the homework name inside a record.
const NAME_KEY: &str = "homework_name";

/// Key holding the review status inside a record.
const STATUS_KEY: &str = "status";

// ============================================================================
// Locale
// ============================================================================

/// Language used for outgoing chat messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// Russian.
    Ru,
}

impl Locale {
    /// Parses a string into a `Locale`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" => Some(Self::En),
            "ru" => Some(Self::Ru),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid locale '{s}': expected one of 'en', 'ru'"))
        })
    }
}

impl Serialize for Locale {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::En => "en",
            Self::Ru => "ru",
        };
        serializer.serialize_str(s)
    }
}

// ============================================================================
// HomeworkStatus
// ============================================================================

/// Review status of a homework submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    /// The reviewer accepted the work.
    Approved,
    /// A reviewer has picked the work up.
    Reviewing,
    /// The reviewer sent the work back with remarks.
    Rejected,
}

impl HomeworkStatus {
    /// Maps a raw API status string onto a known status.
    ///
    /// The vocabulary is closed: anything other than the three recognized
    /// keys yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwbot_orchestrator::HomeworkStatus;
    ///
    /// assert_eq!(HomeworkStatus::from_raw("approved"), Some(HomeworkStatus::Approved));
    /// assert_eq!(HomeworkStatus::from_raw("Approved"), None);
    /// ```
    #[must_use]
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "approved" => Some(Self::Approved),
            "reviewing" => Some(Self::Reviewing),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns the verdict text for this status.
    #[must_use]
    pub const fn verdict(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Self::Approved) => {
                "The work has been reviewed: the reviewer liked everything. Hooray!"
            }
            (Locale::En, Self::Reviewing) => "The work has been taken for review by a reviewer.",
            (Locale::En, Self::Rejected) => "The work has been reviewed: the reviewer has remarks.",
            (Locale::Ru, Self::Approved) => "Работа проверена: ревьюеру всё понравилось. Ура!",
            (Locale::Ru, Self::Reviewing) => "Работа взята на проверку ревьюером.",
            (Locale::Ru, Self::Rejected) => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl std::fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Reviewing => write!(f, "reviewing"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

// ============================================================================
// Homework
// ============================================================================

/// A validated homework record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homework {
    /// Name of the submitted homework.
    pub name: String,
    /// Current review status.
    pub status: HomeworkStatus,
}

impl Homework {
    /// Validates a raw homework record taken from an API response.
    ///
    /// A key whose value is JSON `null` counts as absent.
    pub fn from_record(record: &Value) -> Result<Self> {
        let fields = record
            .as_object()
            .ok_or_else(|| HwbotError::shape("Homework record is not a JSON object"))?;

        let name = match fields.get(NAME_KEY) {
            None | Some(Value::Null) => return Err(HwbotError::missing_key(NAME_KEY)),
            Some(Value::String(name)) => name.clone(),
            Some(other) => other.to_string(),
        };

        let status = match fields.get(STATUS_KEY) {
            None | Some(Value::Null) => return Err(HwbotError::missing_key(STATUS_KEY)),
            Some(Value::String(raw)) => {
                HomeworkStatus::from_raw(raw).ok_or_else(|| HwbotError::unknown_status(raw))?
            }
            Some(other) => return Err(HwbotError::unknown_status(other.to_string())),
        };

        Ok(Self { name, status })
    }

    /// Formats the chat message announcing this record's status.
    #[must_use]
    pub fn status_message(&self, locale: Locale) -> String {
        let verdict = self.status.verdict(locale);
        match locale {
            Locale::En => format!(
                "The review status of \"{}\" has changed. {verdict}",
                self.name
            ),
            Locale::Ru => format!(
                "Изменился статус проверки работы \"{}\". {verdict}",
                self.name
            ),
        }
    }
}

// ============================================================================
// Validation entry points
// ============================================================================

/// Checks the shape of an API response and returns its most recent record.
///
/// The API lists records most-recent-first, so the first element wins.
///
/// # Errors
///
/// - `ShapeError` if the response is not an object or `homeworks` is not a list.
/// - `MissingKey` if `homeworks` is absent or null.
/// - `EmptyHomeworks` if the list is empty.
pub fn extract_latest(raw: &Value) -> Result<&Value> {
    let body = raw
        .as_object()
        .ok_or_else(|| HwbotError::shape("API response is not a JSON object"))?;

    let homeworks = match body.get(HOMEWORKS_KEY) {
        None | Some(Value::Null) => return Err(HwbotError::missing_key(HOMEWORKS_KEY)),
        Some(value) => value
            .as_array()
            .ok_or_else(|| HwbotError::shape("'homeworks' is not a list"))?,
    };

    homeworks.first().ok_or(HwbotError::EmptyHomeworks)
}

/// Returns `true` if a record carries nothing to translate.
///
/// `null`, `false`, zero, and empty strings, lists and objects are blank.
/// A blank latest record means there is nothing to report this cycle.
#[must_use]
pub fn is_blank_record(record: &Value) -> bool {
    match record {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Translates a raw homework record into its chat message.
///
/// # Errors
///
/// - `ShapeError` if the record is not an object.
/// - `MissingKey` if `homework_name` or `status` is absent.
/// - `UnknownStatus` if `status` is outside the verdict vocabulary.
pub fn parse_status(record: &Value, locale: Locale) -> Result<String> {
    Homework::from_record(record).map(|homework| homework.status_message(locale))
}

/// Returns the server timestamp carried by an API response, if any.
#[must_use]
pub fn current_date(raw: &Value) -> Option<i64> {
    raw.get(CURRENT_DATE_KEY).and_then(Value::as_i64)
}

// ============================================================================
// Tests
// ============================================================================
