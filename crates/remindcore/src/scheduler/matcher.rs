use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use strum::{Display, EnumString};

use crate::entry::{Entry, EntryKind};

/// How a birthday's lead time is compared with the days remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MatchPolicy {
    /// Due only on the day that is exactly `reminder_lead` days before
    #[default]
    Exact,
    /// Due on every day from `reminder_lead` days before up to the birthday itself
    #[strum(to_string = "window", serialize = "lead_window")]
    LeadWindow,
}

/// An entry whose notification should go out now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueNotification {
    pub entry: Entry,
    /// Whole days until the birthday; `None` for reminders
    pub days_remaining: Option<i64>,
}

/// Whole calendar days from `today` to `date` (negative once it has passed).
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Decide whether `entry` is due at `now`. Delivered entries never are.
pub fn match_entry(entry: &Entry, policy: MatchPolicy, now: NaiveDateTime) -> Option<DueNotification> {
    if entry.is_delivered() {
        return None;
    }

    let days_remaining = match &entry.kind {
        EntryKind::Birthday(b) => {
            let days = days_until(b.birthday_date, now.date());
            let due = match policy {
                MatchPolicy::Exact => days == b.reminder_lead,
                MatchPolicy::LeadWindow => (0..=b.reminder_lead).contains(&days),
            };
            if !due {
                return None;
            }
            Some(days)
        }
        EntryKind::Reminder(r) => {
            if r.remind_at > now {
                return None;
            }
            None
        }
    };

    Some(DueNotification {
        entry: entry.clone(),
        days_remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{BirthdayEntry, Owner, ReminderEntry};
    use chrono::Duration;

    fn today() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 2, 18).unwrap().and_hms_opt(23, 59, 0).unwrap()
    }

    fn birthday_in(days: i64, lead: i64) -> Entry {
        Entry {
            id: 1,
            owner: Owner::new(1, 1),
            kind: EntryKind::Birthday(BirthdayEntry {
                name: "Alice".to_string(),
                birthday_date: today().date() + Duration::days(days),
                reminder_lead: lead,
                gifts: String::new(),
                note: String::new(),
            }),
            delivered_at: None,
        }
    }

    fn reminder_at(remind_at: NaiveDateTime) -> Entry {
        Entry {
            id: 2,
            owner: Owner::new(1, 1),
            kind: EntryKind::Reminder(ReminderEntry {
                text: "Call mom".to_string(),
                remind_at,
            }),
            delivered_at: None,
        }
    }

    #[test]
    fn exact_policy_matches_only_the_lead_day() {
        assert!(match_entry(&birthday_in(5, 5), MatchPolicy::Exact, today()).is_some());
        assert!(match_entry(&birthday_in(5, 4), MatchPolicy::Exact, today()).is_none());
        assert!(match_entry(&birthday_in(5, 6), MatchPolicy::Exact, today()).is_none());
    }

    #[test]
    fn days_are_counted_in_calendar_days() {
        // Late in the evening the birthday is still five days away, not four
        let due = match_entry(&birthday_in(5, 5), MatchPolicy::Exact, today()).unwrap();
        assert_eq!(due.days_remaining, Some(5));
    }

    #[test]
    fn window_policy_matches_up_to_the_birthday() {
        let policy = MatchPolicy::LeadWindow;
        assert!(match_entry(&birthday_in(3, 5), policy, today()).is_some());
        assert!(match_entry(&birthday_in(0, 5), policy, today()).is_some());
        assert!(match_entry(&birthday_in(6, 5), policy, today()).is_none());
        assert!(match_entry(&birthday_in(-1, 5), policy, today()).is_none());
    }

    #[test]
    fn reminder_due_once_time_has_come() {
        let at = today();
        assert!(match_entry(&reminder_at(at), MatchPolicy::Exact, at).is_some());
        assert!(match_entry(&reminder_at(at - Duration::hours(3)), MatchPolicy::Exact, at).is_some());
        assert!(match_entry(&reminder_at(at + Duration::minutes(1)), MatchPolicy::Exact, at).is_none());
    }

    #[test]
    fn delivered_entries_never_match() {
        let mut entry = reminder_at(today() - Duration::minutes(1));
        entry.delivered_at = Some(today());
        assert!(match_entry(&entry, MatchPolicy::Exact, today()).is_none());
    }

    #[test]
    fn policy_parses_from_config_values() {
        assert_eq!("exact".parse::<MatchPolicy>().unwrap(), MatchPolicy::Exact);
        assert_eq!("Window".parse::<MatchPolicy>().unwrap(), MatchPolicy::LeadWindow);
        assert_eq!("lead_window".parse::<MatchPolicy>().unwrap(), MatchPolicy::LeadWindow);
        assert!("sometimes".parse::<MatchPolicy>().is_err());
        assert_eq!(MatchPolicy::default().to_string(), "exact");
        assert_eq!(MatchPolicy::LeadWindow.to_string(), "window");
    }
}
