//! JSON export of stored entries (used by the `export` CLI subcommand).

use serde::Serialize;

use crate::core::error::AppResult;
use crate::entry::{Entry, EntryKind, STORED_DATETIME_FORMAT, STORED_DATE_FORMAT};
use crate::storage::EntryStore;

#[derive(Debug, Serialize)]
struct ExportEntry {
    id: i64,
    chat_id: i64,
    user_id: i64,
    username: Option<String>,
    kind: String,
    text: String,
    due: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    lead_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gifts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    delivered_at: Option<String>,
}

impl From<&Entry> for ExportEntry {
    fn from(entry: &Entry) -> Self {
        let (text, due, lead_days, gifts, note) = match &entry.kind {
            EntryKind::Birthday(b) => (
                b.name.clone(),
                b.birthday_date.format(STORED_DATE_FORMAT).to_string(),
                Some(b.reminder_lead),
                Some(b.gifts.clone()),
                Some(b.note.clone()),
            ),
            EntryKind::Reminder(r) => (
                r.text.clone(),
                r.remind_at.format(STORED_DATETIME_FORMAT).to_string(),
                None,
                None,
                None,
            ),
        };

        Self {
            id: entry.id,
            chat_id: entry.owner.chat_id,
            user_id: entry.owner.user_id,
            username: entry.owner.username.clone(),
            kind: entry.variant().to_string(),
            text,
            due,
            lead_days,
            gifts,
            note,
            delivered_at: entry
                .delivered_at
                .map(|at| at.format(STORED_DATETIME_FORMAT).to_string()),
        }
    }
}

/// Render entries as a pretty-printed JSON array.
pub fn export_json(entries: &[Entry]) -> AppResult<String> {
    let export_entries: Vec<ExportEntry> = entries.iter().map(ExportEntry::from).collect();
    Ok(serde_json::to_string_pretty(&export_entries)?)
}

/// Export one chat's entries, or every decodable entry when `chat_id` is `None`.
pub fn export_store(store: &EntryStore, chat_id: Option<i64>) -> AppResult<String> {
    let entries = match chat_id {
        Some(chat_id) => store.list(chat_id)?,
        None => store
            .list_all()?
            .into_iter()
            .flat_map(|owner| owner.entries)
            .collect(),
    };
    export_json(&entries)
}
