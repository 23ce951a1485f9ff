//! Entry model shared by the store, the conversation engine and the scheduler.
//!
//! An `Entry` is always complete: partial input lives in a
//! [`Draft`](crate::conversation::Draft) inside a conversation and only becomes
//! a `NewEntry` once every required field has been validated.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Input format for birthday dates (`31-12-1990`)
pub const BIRTHDAY_INPUT_FORMAT: &str = "%d-%m-%Y";

/// Input format for reminder date-times (`2030-05-01 09:00`)
pub const REMINDER_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Storage format for birthday dates
pub const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage format for reminder date-times and delivery markers
pub const STORED_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who an entry or conversation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Chat the entry was created in; notifications go back here
    pub chat_id: i64,
    /// Telegram user who created the entry
    pub user_id: i64,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

impl Owner {
    pub fn new(chat_id: i64, user_id: i64) -> Self {
        Self {
            chat_id,
            user_id,
            username: None,
            language_code: None,
        }
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    pub fn with_language(mut self, language_code: Option<String>) -> Self {
        self.language_code = language_code;
        self
    }
}

/// Which kind of entry a conversation collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryVariant {
    Birthday,
    Reminder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdayEntry {
    pub name: String,
    pub birthday_date: NaiveDate,
    /// Days before `birthday_date` the notification is wanted
    pub reminder_lead: i64,
    pub gifts: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEntry {
    pub text: String,
    pub remind_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntryKind {
    Birthday(BirthdayEntry),
    Reminder(ReminderEntry),
}

impl EntryKind {
    pub fn variant(&self) -> EntryVariant {
        match self {
            EntryKind::Birthday(_) => EntryVariant::Birthday,
            EntryKind::Reminder(_) => EntryVariant::Reminder,
        }
    }
}

/// A completed entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub owner: Owner,
    pub kind: EntryKind,
}

/// A completed, persisted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: i64,
    pub owner: Owner,
    #[serde(flatten)]
    pub kind: EntryKind,
    /// When the notification for this entry was handed off, if ever
    pub delivered_at: Option<NaiveDateTime>,
}

impl Entry {
    pub fn variant(&self) -> EntryVariant {
        self.kind.variant()
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered_at.is_some()
    }
}

/// A stored row that failed read-time re-validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryDecodeError {
    #[error("entry {id}: unknown kind '{kind}'")]
    UnknownKind { id: i64, kind: String },

    #[error("entry {id}: cannot parse '{value}' as {expected}")]
    BadTimestamp {
        id: i64,
        value: String,
        expected: &'static str,
    },

    #[error("entry {id}: birthday without lead days")]
    MissingLeadDays { id: i64 },

    #[error("entry {id}: lead days '{value}' is not an integer")]
    BadLeadDays { id: i64, value: String },
}

pub fn parse_birthday_input(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), BIRTHDAY_INPUT_FORMAT).ok()
}

pub fn parse_reminder_input(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), REMINDER_INPUT_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn birthday_input_uses_day_month_year() {
        assert_eq!(
            parse_birthday_input("28-02-2030"),
            NaiveDate::from_ymd_opt(2030, 2, 28)
        );
        assert_eq!(parse_birthday_input(" 01-12-1990 "), NaiveDate::from_ymd_opt(1990, 12, 1));
    }

    #[test]
    fn birthday_input_rejects_impossible_dates() {
        assert_eq!(parse_birthday_input("31-02-2030"), None);
        assert_eq!(parse_birthday_input("2030-02-28"), None);
        assert_eq!(parse_birthday_input("tomorrow"), None);
    }

    #[test]
    fn reminder_input_requires_time() {
        let expected = NaiveDate::from_ymd_opt(2030, 5, 1).unwrap().and_hms_opt(9, 0, 0);
        assert_eq!(parse_reminder_input("2030-05-01 09:00"), expected);
        assert_eq!(parse_reminder_input("2030-05-01"), None);
        assert_eq!(parse_reminder_input("01-05-2030 09:00"), None);
    }

    #[test]
    fn variant_round_trips_through_strings() {
        assert_eq!(EntryVariant::Birthday.as_ref(), "birthday");
        assert_eq!("reminder".parse::<EntryVariant>().unwrap(), EntryVariant::Reminder);
    }
}
