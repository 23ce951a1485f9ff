//! Conversation steps and the partially collected entry.
//!
//! Each `Draft` stage carries exactly the fields collected so far, so an
//! incomplete entry cannot be turned into an `EntryKind` by accident.

use chrono::{NaiveDate, NaiveDateTime};
use strum::Display;

use super::validation::{self, ValidationError};
use crate::entry::{BirthdayEntry, EntryKind, EntryVariant, Owner, ReminderEntry};

/// Field the conversation is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    AwaitingName,
    AwaitingDate,
    AwaitingLeadDays,
    AwaitingGifts,
    AwaitingNote,
    AwaitingText,
    AwaitingDateTime,
}

impl Step {
    pub fn prompt(self) -> Prompt {
        match self {
            Step::AwaitingName => Prompt::Name,
            Step::AwaitingDate => Prompt::Date,
            Step::AwaitingLeadDays => Prompt::LeadDays,
            Step::AwaitingGifts => Prompt::Gifts,
            Step::AwaitingNote => Prompt::Note,
            Step::AwaitingText => Prompt::Text,
            Step::AwaitingDateTime => Prompt::DateTime,
        }
    }
}

/// Question the bot should ask next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prompt {
    Name,
    Date,
    LeadDays,
    Gifts,
    Note,
    Text,
    DateTime,
}

impl Prompt {
    /// Fluent message id for this prompt
    pub fn key(&self) -> &'static str {
        match self {
            Prompt::Name => "prompt.name",
            Prompt::Date => "prompt.date",
            Prompt::LeadDays => "prompt.lead_days",
            Prompt::Gifts => "prompt.gifts",
            Prompt::Note => "prompt.note",
            Prompt::Text => "prompt.text",
            Prompt::DateTime => "prompt.datetime",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BirthdayDraft {
    Name,
    Date {
        name: String,
    },
    LeadDays {
        name: String,
        birthday_date: NaiveDate,
    },
    Gifts {
        name: String,
        birthday_date: NaiveDate,
        reminder_lead: i64,
    },
    Note {
        name: String,
        birthday_date: NaiveDate,
        reminder_lead: i64,
        gifts: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderDraft {
    Text,
    DateTime { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Birthday(BirthdayDraft),
    Reminder(ReminderDraft),
}

/// Result of feeding one message into a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Next(Draft),
    Complete(EntryKind),
}

impl Draft {
    pub fn new(variant: EntryVariant) -> Self {
        match variant {
            EntryVariant::Birthday => Draft::Birthday(BirthdayDraft::Name),
            EntryVariant::Reminder => Draft::Reminder(ReminderDraft::Text),
        }
    }

    pub fn variant(&self) -> EntryVariant {
        match self {
            Draft::Birthday(_) => EntryVariant::Birthday,
            Draft::Reminder(_) => EntryVariant::Reminder,
        }
    }

    pub fn step(&self) -> Step {
        match self {
            Draft::Birthday(BirthdayDraft::Name) => Step::AwaitingName,
            Draft::Birthday(BirthdayDraft::Date { .. }) => Step::AwaitingDate,
            Draft::Birthday(BirthdayDraft::LeadDays { .. }) => Step::AwaitingLeadDays,
            Draft::Birthday(BirthdayDraft::Gifts { .. }) => Step::AwaitingGifts,
            Draft::Birthday(BirthdayDraft::Note { .. }) => Step::AwaitingNote,
            Draft::Reminder(ReminderDraft::Text) => Step::AwaitingText,
            Draft::Reminder(ReminderDraft::DateTime { .. }) => Step::AwaitingDateTime,
        }
    }

    /// Name (birthday) or text (reminder) once it has been collected.
    pub fn title(&self) -> Option<&str> {
        match self {
            Draft::Birthday(BirthdayDraft::Name) | Draft::Reminder(ReminderDraft::Text) => None,
            Draft::Birthday(
                BirthdayDraft::Date { name }
                | BirthdayDraft::LeadDays { name, .. }
                | BirthdayDraft::Gifts { name, .. }
                | BirthdayDraft::Note { name, .. },
            ) => Some(name.as_str()),
            Draft::Reminder(ReminderDraft::DateTime { text }) => Some(text.as_str()),
        }
    }

    /// Validate `text` against the current step and move on.
    ///
    /// On error `self` is untouched, so the caller keeps the same step and
    /// every field collected so far.
    pub fn advance(&self, text: &str) -> Result<Transition, ValidationError> {
        let next = match self {
            Draft::Birthday(draft) => Draft::Birthday(match draft {
                BirthdayDraft::Name => BirthdayDraft::Date {
                    name: validation::require_text(text)?.to_string(),
                },
                BirthdayDraft::Date { name } => BirthdayDraft::LeadDays {
                    name: name.clone(),
                    birthday_date: validation::birthday_date(text)?,
                },
                BirthdayDraft::LeadDays { name, birthday_date } => BirthdayDraft::Gifts {
                    name: name.clone(),
                    birthday_date: *birthday_date,
                    reminder_lead: validation::lead_days(text)?,
                },
                BirthdayDraft::Gifts {
                    name,
                    birthday_date,
                    reminder_lead,
                } => BirthdayDraft::Note {
                    name: name.clone(),
                    birthday_date: *birthday_date,
                    reminder_lead: *reminder_lead,
                    gifts: text.to_string(),
                },
                BirthdayDraft::Note {
                    name,
                    birthday_date,
                    reminder_lead,
                    gifts,
                } => {
                    return Ok(Transition::Complete(EntryKind::Birthday(BirthdayEntry {
                        name: name.clone(),
                        birthday_date: *birthday_date,
                        reminder_lead: *reminder_lead,
                        gifts: gifts.clone(),
                        note: text.to_string(),
                    })))
                }
            }),
            Draft::Reminder(draft) => match draft {
                ReminderDraft::Text => Draft::Reminder(ReminderDraft::DateTime {
                    text: validation::require_text(text)?.trim().to_string(),
                }),
                ReminderDraft::DateTime { text: reminder } => {
                    let remind_at: NaiveDateTime = validation::reminder_time(text)?;
                    return Ok(Transition::Complete(EntryKind::Reminder(ReminderEntry {
                        text: reminder.clone(),
                        remind_at,
                    })));
                }
            },
        };
        Ok(Transition::Next(next))
    }
}

/// One user's in-progress conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    pub owner: Owner,
    pub draft: Draft,
    pub last_activity: NaiveDateTime,
}

impl ConversationState {
    pub fn new(owner: Owner, variant: EntryVariant, now: NaiveDateTime) -> Self {
        Self {
            owner,
            draft: Draft::new(variant),
            last_activity: now,
        }
    }

    pub fn step(&self) -> Step {
        self.draft.step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feed(mut draft: Draft, inputs: &[&str]) -> Result<Transition, ValidationError> {
        let (last, init) = inputs.split_last().unwrap();
        for input in init {
            match draft.advance(input)? {
                Transition::Next(next) => draft = next,
                Transition::Complete(kind) => panic!("completed early with {:?}", kind),
            }
        }
        draft.advance(last)
    }

    #[test]
    fn birthday_steps_in_order() {
        let mut draft = Draft::new(EntryVariant::Birthday);
        let mut seen = vec![draft.step()];
        for input in ["Alice", "28-02-2030", "10", "book"] {
            match draft.advance(input).unwrap() {
                Transition::Next(next) => draft = next,
                other => panic!("unexpected {:?}", other),
            }
            seen.push(draft.step());
        }
        assert_eq!(
            seen,
            vec![
                Step::AwaitingName,
                Step::AwaitingDate,
                Step::AwaitingLeadDays,
                Step::AwaitingGifts,
                Step::AwaitingNote,
            ]
        );
    }

    #[test]
    fn birthday_completes_with_verbatim_fields() {
        let outcome = feed(
            Draft::new(EntryVariant::Birthday),
            &[" Alice ", "28-02-2030", "10", "", "  none"],
        )
        .unwrap();
        assert_eq!(
            outcome,
            Transition::Complete(EntryKind::Birthday(BirthdayEntry {
                name: " Alice ".to_string(),
                birthday_date: NaiveDate::from_ymd_opt(2030, 2, 28).unwrap(),
                reminder_lead: 10,
                gifts: String::new(),
                note: "  none".to_string(),
            }))
        );
    }

    #[test]
    fn reminder_text_is_trimmed() {
        let outcome = feed(Draft::new(EntryVariant::Reminder), &["  Call mom ", "2030-05-01 09:00"]).unwrap();
        match outcome {
            Transition::Complete(EntryKind::Reminder(r)) => assert_eq!(r.text, "Call mom"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn invalid_input_leaves_draft_unchanged() {
        let draft = Draft::Birthday(BirthdayDraft::Date {
            name: "Alice".to_string(),
        });
        assert_eq!(draft.advance("31-02-2030"), Err(ValidationError::WrongDateFormat));
        assert_eq!(draft.step(), Step::AwaitingDate);
        assert_eq!(draft.title(), Some("Alice"));
    }

    #[test]
    fn every_step_has_a_distinct_prompt_key() {
        let steps = [
            Step::AwaitingName,
            Step::AwaitingDate,
            Step::AwaitingLeadDays,
            Step::AwaitingGifts,
            Step::AwaitingNote,
            Step::AwaitingText,
            Step::AwaitingDateTime,
        ];
        let mut keys: Vec<_> = steps.iter().map(|s| s.prompt().key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), steps.len());
        assert_eq!(Step::AwaitingLeadDays.to_string(), "awaiting_lead_days");
    }
}
