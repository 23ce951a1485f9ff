//! Turns structured core results into localized message text.

use fluent_templates::fluent_bundle::FluentArgs;
use unic_langid::LanguageIdentifier;

use remindcore::entry::{BIRTHDAY_INPUT_FORMAT, REMINDER_INPUT_FORMAT};
use remindcore::storage::OwnerEntries;
use remindcore::{DueNotification, Entry, EntryKind, Reply};

use crate::i18n;

/// Message for one conversation step result
pub fn reply(lang: &LanguageIdentifier, reply: &Reply) -> String {
    match reply {
        Reply::Prompt(prompt) => i18n::t(lang, prompt.key()),
        Reply::Invalid { error, reprompt } => {
            format!("{}\n{}", i18n::t(lang, error.key()), i18n::t(lang, reprompt.key()))
        }
        Reply::Completed(entry) => confirmation(lang, entry),
    }
}

/// "Saved!" message echoing every field of the new entry
pub fn confirmation(lang: &LanguageIdentifier, entry: &Entry) -> String {
    let mut args = FluentArgs::new();
    match &entry.kind {
        EntryKind::Birthday(b) => {
            args.set("name", b.name.clone());
            args.set("date", b.birthday_date.format(BIRTHDAY_INPUT_FORMAT).to_string());
            args.set("lead", b.reminder_lead);
            args.set("gifts", b.gifts.clone());
            args.set("note", b.note.clone());
            i18n::t_args(lang, "saved.birthday", &args)
        }
        EntryKind::Reminder(r) => {
            args.set("text", r.text.clone());
            args.set("when", r.remind_at.format(REMINDER_INPUT_FORMAT).to_string());
            i18n::t_args(lang, "saved.reminder", &args)
        }
    }
}

/// One numbered listing line
pub fn entry_line(lang: &LanguageIdentifier, index: usize, entry: &Entry) -> String {
    let mut args = FluentArgs::new();
    args.set("index", index);
    let mut line = match &entry.kind {
        EntryKind::Birthday(b) => {
            args.set("name", b.name.clone());
            args.set("date", b.birthday_date.format(BIRTHDAY_INPUT_FORMAT).to_string());
            args.set("lead", b.reminder_lead);
            i18n::t_args(lang, "list.birthday_item", &args)
        }
        EntryKind::Reminder(r) => {
            args.set("text", r.text.clone());
            args.set("when", r.remind_at.format(REMINDER_INPUT_FORMAT).to_string());
            i18n::t_args(lang, "list.reminder_item", &args)
        }
    };
    if entry.is_delivered() {
        line.push(' ');
        line.push_str(&i18n::t(lang, "list.delivered"));
    }
    line
}

/// `/list` output; numbers match what `/delete` expects
pub fn list(lang: &LanguageIdentifier, entries: &[Entry]) -> String {
    if entries.is_empty() {
        return i18n::t(lang, "list.empty");
    }
    let mut text = i18n::t(lang, "list.header");
    for (idx, entry) in entries.iter().enumerate() {
        text.push('\n');
        text.push_str(&entry_line(lang, idx + 1, entry));
    }
    text
}

/// `/all` output: every owner, including those without entries
pub fn admin_listing(lang: &LanguageIdentifier, owners: &[OwnerEntries]) -> String {
    if owners.is_empty() {
        return i18n::t(lang, "admin.empty");
    }
    let mut text = i18n::t(lang, "admin.header");
    for owner in owners {
        let mut args = FluentArgs::new();
        let user = match &owner.username {
            Some(username) => format!("@{} ({})", username, owner.user_id),
            None => owner.user_id.to_string(),
        };
        args.set("user", user);
        args.set("count", owner.entries.len());

        text.push_str("\n\n");
        text.push_str(&i18n::t_args(lang, "admin.owner", &args));
        if owner.entries.is_empty() {
            text.push_str("\n   ");
            text.push_str(&i18n::t(lang, "admin.no_entries"));
        }
        for (idx, entry) in owner.entries.iter().enumerate() {
            text.push_str("\n   ");
            text.push_str(&entry_line(lang, idx + 1, entry));
        }
    }
    text
}

/// Scheduled notification text
pub fn notification(lang: &LanguageIdentifier, due: &DueNotification) -> String {
    let mut args = FluentArgs::new();
    match &due.entry.kind {
        EntryKind::Birthday(b) => {
            args.set("name", b.name.clone());
            args.set("date", b.birthday_date.format(BIRTHDAY_INPUT_FORMAT).to_string());
            args.set("gifts", b.gifts.clone());
            args.set("note", b.note.clone());
            match due.days_remaining {
                Some(days) if days > 0 => {
                    args.set("days", days);
                    i18n::t_args(lang, "notify.birthday", &args)
                }
                _ => i18n::t_args(lang, "notify.birthday_today", &args),
            }
        }
        EntryKind::Reminder(r) => {
            args.set("text", r.text.clone());
            i18n::t_args(lang, "notify.reminder", &args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use remindcore::{BirthdayEntry, Owner, Prompt, ReminderEntry, ValidationError};

    fn en() -> LanguageIdentifier {
        i18n::lang_from_code("en")
    }

    fn birthday() -> Entry {
        Entry {
            id: 1,
            owner: Owner::new(10, 10),
            kind: EntryKind::Birthday(BirthdayEntry {
                name: "Alice".to_string(),
                birthday_date: NaiveDate::from_ymd_opt(2030, 2, 28).unwrap(),
                reminder_lead: 10,
                gifts: "book".to_string(),
                note: "none".to_string(),
            }),
            delivered_at: None,
        }
    }

    fn reminder() -> Entry {
        Entry {
            id: 2,
            owner: Owner::new(10, 10),
            kind: EntryKind::Reminder(ReminderEntry {
                text: "Call mom".to_string(),
                remind_at: NaiveDate::from_ymd_opt(2030, 5, 1).unwrap().and_hms_opt(9, 0, 0).unwrap(),
            }),
            delivered_at: None,
        }
    }

    #[test]
    fn confirmation_echoes_all_birthday_fields() {
        let text = confirmation(&en(), &birthday());
        for part in ["Alice", "28-02-2030", "10", "book", "none"] {
            assert!(text.contains(part), "{:?} missing from {:?}", part, text);
        }
    }

    #[test]
    fn invalid_reply_repeats_the_question() {
        let text = reply(
            &en(),
            &Reply::Invalid {
                error: ValidationError::WrongDateFormat,
                reprompt: Prompt::Date,
            },
        );
        assert_eq!(text, "Wrong date format. Use DD-MM-YYYY.\nEnter the birth date as DD-MM-YYYY:");
    }

    #[test]
    fn list_numbers_entries_from_one() {
        let text = list(&en(), &[birthday(), reminder()]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Your reminders:");
        assert!(lines[1].starts_with("1. "));
        assert_eq!(lines[2], "2. ⏰ Call mom, 2030-05-01 09:00");
    }

    #[test]
    fn empty_list_is_explicit() {
        assert_eq!(list(&en(), &[]), "You have no reminders yet.");
    }

    #[test]
    fn admin_listing_shows_idle_owners() {
        let owners = vec![
            OwnerEntries {
                user_id: 10,
                username: Some("alice".to_string()),
                entries: vec![reminder()],
            },
            OwnerEntries {
                user_id: 20,
                username: None,
                entries: vec![],
            },
        ];
        let text = admin_listing(&en(), &owners);
        assert!(text.contains("@alice (10) (1)"));
        assert!(text.contains("20 (0)"));
        assert!(text.contains("no reminders"));
    }

    #[test]
    fn birthday_notification_mentions_days_left() {
        let due = DueNotification {
            entry: birthday(),
            days_remaining: Some(10),
        };
        assert!(notification(&en(), &due).contains("in 10 day(s)"));

        let today = DueNotification {
            entry: birthday(),
            days_remaining: Some(0),
        };
        assert!(notification(&en(), &today).starts_with("🎂 Today"));
    }

    #[test]
    fn delivered_entries_are_marked_in_listing() {
        let mut entry = reminder();
        entry.delivered_at = Some(NaiveDate::from_ymd_opt(2030, 5, 1).unwrap().and_hms_opt(9, 1, 0).unwrap());
        assert!(entry_line(&en(), 1, &entry).ends_with("(sent)"));
    }
}
