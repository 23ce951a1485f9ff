use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::entry::{parse_birthday_input, parse_reminder_input};

/// A field that failed validation. The conversation stays on the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("wrong date format, expected DD-MM-YYYY")]
    WrongDateFormat,

    #[error("wrong date-time format, expected YYYY-MM-DD HH:MM")]
    WrongDateTimeFormat,

    #[error("not an integer number of days")]
    NotAnInteger,

    #[error("number of days cannot be negative")]
    NegativeLeadDays,

    #[error("text cannot be empty")]
    EmptyText,
}

impl ValidationError {
    /// Fluent message id used by the bot to render this error
    pub fn key(&self) -> &'static str {
        match self {
            ValidationError::WrongDateFormat => "validation.wrong_date",
            ValidationError::WrongDateTimeFormat => "validation.wrong_datetime",
            ValidationError::NotAnInteger => "validation.not_integer",
            ValidationError::NegativeLeadDays => "validation.negative_days",
            ValidationError::EmptyText => "validation.empty_text",
        }
    }
}

/// Required free text: must contain something besides whitespace.
pub fn require_text(raw: &str) -> Result<&str, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(raw)
}

pub fn birthday_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    parse_birthday_input(raw).ok_or(ValidationError::WrongDateFormat)
}

pub fn reminder_time(raw: &str) -> Result<NaiveDateTime, ValidationError> {
    parse_reminder_input(raw).ok_or(ValidationError::WrongDateTimeFormat)
}

pub fn lead_days(raw: &str) -> Result<i64, ValidationError> {
    let days: i64 = raw.trim().parse().map_err(|_| ValidationError::NotAnInteger)?;
    if days < 0 {
        return Err(ValidationError::NegativeLeadDays);
    }
    Ok(days)
}
