//! Durable storage of completed entries.
//!
//! Temporal values are stored as text and re-parsed on every read, so a row
//! edited by hand (or written by an older build) surfaces as an
//! [`EntryDecodeError`] for that row only.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::error::AppResult;
use crate::entry::{
    BirthdayEntry, Entry, EntryDecodeError, EntryKind, EntryVariant, NewEntry, Owner, ReminderEntry,
    STORED_DATETIME_FORMAT, STORED_DATE_FORMAT,
};
use crate::storage::db::{create_pool, get_connection, DbPool};

/// One row of a full scan: either a decoded entry or the reason it could not be decoded.
pub type Scanned = Result<Entry, EntryDecodeError>;

/// An owner together with all of their entries (admin listing).
#[derive(Debug, Clone)]
pub struct OwnerEntries {
    pub user_id: i64,
    pub username: Option<String>,
    pub entries: Vec<Entry>,
}

const SELECT_ENTRIES: &str = "SELECT e.id, e.user_id, e.chat_id, e.kind, e.text, e.due_at, e.lead_days,
            e.gifts, e.note, e.delivered_at, o.username, o.language_code
     FROM entries e
     JOIN owners o ON o.user_id = e.user_id";

/// Row as read from SQLite, before re-validation.
struct RawEntry {
    id: i64,
    user_id: i64,
    chat_id: i64,
    kind: String,
    text: String,
    due_at: String,
    lead_days: Value,
    gifts: Option<String>,
    note: Option<String>,
    delivered_at: Option<String>,
    username: Option<String>,
    language_code: Option<String>,
}

fn parse_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        chat_id: row.get(2)?,
        kind: row.get(3)?,
        text: row.get(4)?,
        due_at: row.get(5)?,
        lead_days: row.get(6)?,
        gifts: row.get(7)?,
        note: row.get(8)?,
        delivered_at: row.get(9)?,
        username: row.get(10)?,
        language_code: row.get(11)?,
    })
}

impl RawEntry {
    fn decode(self) -> Result<Entry, EntryDecodeError> {
        let id = self.id;
        let variant: EntryVariant = self
            .kind
            .parse()
            .map_err(|_| EntryDecodeError::UnknownKind { id, kind: self.kind.clone() })?;

        let kind = match variant {
            EntryVariant::Birthday => {
                let birthday_date = NaiveDate::parse_from_str(self.due_at.trim(), STORED_DATE_FORMAT).map_err(|_| {
                    EntryDecodeError::BadTimestamp {
                        id,
                        value: self.due_at.clone(),
                        expected: "date",
                    }
                })?;
                let reminder_lead = match self.lead_days {
                    Value::Integer(days) => days,
                    Value::Text(ref raw) => raw
                        .trim()
                        .parse()
                        .map_err(|_| EntryDecodeError::BadLeadDays { id, value: raw.clone() })?,
                    Value::Null => return Err(EntryDecodeError::MissingLeadDays { id }),
                    ref other => {
                        return Err(EntryDecodeError::BadLeadDays {
                            id,
                            value: format!("{:?}", other),
                        })
                    }
                };
                EntryKind::Birthday(BirthdayEntry {
                    name: self.text,
                    birthday_date,
                    reminder_lead,
                    gifts: self.gifts.unwrap_or_default(),
                    note: self.note.unwrap_or_default(),
                })
            }
            EntryVariant::Reminder => {
                let remind_at = parse_stored_datetime(&self.due_at).ok_or_else(|| EntryDecodeError::BadTimestamp {
                    id,
                    value: self.due_at.clone(),
                    expected: "date-time",
                })?;
                EntryKind::Reminder(ReminderEntry {
                    text: self.text,
                    remind_at,
                })
            }
        };

        let delivered_at = match self.delivered_at {
            Some(raw) => Some(
                parse_stored_datetime(&raw).ok_or(EntryDecodeError::BadTimestamp {
                    id,
                    value: raw,
                    expected: "delivery time",
                })?,
            ),
            None => None,
        };

        Ok(Entry {
            id,
            owner: Owner {
                chat_id: self.chat_id,
                user_id: self.user_id,
                username: self.username,
                language_code: self.language_code,
            },
            kind,
            delivered_at,
        })
    }
}

fn parse_stored_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), STORED_DATETIME_FORMAT).ok()
}

fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(STORED_DATETIME_FORMAT).to_string()
}

/// Create the owner row or refresh its username / language.
pub fn upsert_owner(conn: &Connection, owner: &Owner) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO owners (user_id, username, language_code)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET
           username = COALESCE(excluded.username, owners.username),
           language_code = COALESCE(excluded.language_code, owners.language_code)",
        params![owner.user_id, owner.username, owner.language_code],
    )?;
    Ok(())
}

/// Insert the owner and the entry in one transaction. Returns the new entry id.
pub fn insert_entry(conn: &Connection, entry: &NewEntry) -> rusqlite::Result<i64> {
    let tx = conn.unchecked_transaction()?;
    upsert_owner(&tx, &entry.owner)?;

    match &entry.kind {
        EntryKind::Birthday(b) => {
            tx.execute(
                "INSERT INTO entries (user_id, chat_id, kind, text, due_at, lead_days, gifts, note)
                 VALUES (?1, ?2, 'birthday', ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.owner.user_id,
                    entry.owner.chat_id,
                    b.name,
                    b.birthday_date.format(STORED_DATE_FORMAT).to_string(),
                    b.reminder_lead,
                    b.gifts,
                    b.note,
                ],
            )?;
        }
        EntryKind::Reminder(r) => {
            tx.execute(
                "INSERT INTO entries (user_id, chat_id, kind, text, due_at)
                 VALUES (?1, ?2, 'reminder', ?3, ?4)",
                params![
                    entry.owner.user_id,
                    entry.owner.chat_id,
                    r.text,
                    format_datetime(&r.remind_at),
                ],
            )?;
        }
    }

    let id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(id)
}

/// All entries of a chat in insertion order, undecoded.
fn query_chat_entries(conn: &Connection, chat_id: i64) -> rusqlite::Result<Vec<RawEntry>> {
    let mut stmt = conn.prepare(&format!("{} WHERE e.chat_id = ?1 ORDER BY e.id ASC", SELECT_ENTRIES))?;
    let rows = stmt.query_map(params![chat_id], parse_row)?;
    rows.collect()
}

/// Every entry of every owner in insertion order, undecoded.
fn query_all_entries(conn: &Connection) -> rusqlite::Result<Vec<RawEntry>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY e.id ASC", SELECT_ENTRIES))?;
    let rows = stmt.query_map([], parse_row)?;
    rows.collect()
}

fn decode_or_warn(raw: RawEntry) -> Option<Entry> {
    match raw.decode() {
        Ok(entry) => Some(entry),
        Err(e) => {
            log::warn!("Skipping undecodable entry: {}", e);
            None
        }
    }
}

/// Durable store of completed entries, shared by the conversation engine
/// (writer) and the sweep scheduler (reader).
///
/// Cloning is cheap: clones share the same connection pool.
#[derive(Clone)]
pub struct EntryStore {
    pool: Arc<DbPool>,
}

impl EntryStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Open (and migrate) the database at `database_path`.
    pub fn open(database_path: &str) -> AppResult<Self> {
        Ok(Self::new(Arc::new(create_pool(database_path)?)))
    }

    pub fn pool(&self) -> &Arc<DbPool> {
        &self.pool
    }

    /// Record the owner identity without creating an entry.
    pub fn register_owner(&self, owner: &Owner) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        upsert_owner(&conn, owner)?;
        Ok(())
    }

    /// Persist a completed entry atomically and return it with its id.
    pub fn put(&self, entry: NewEntry) -> AppResult<Entry> {
        let conn = get_connection(&self.pool)?;
        let id = insert_entry(&conn, &entry)?;
        log::debug!(
            "Stored {} entry {} for chat {}",
            entry.kind.variant(),
            id,
            entry.owner.chat_id
        );

        Ok(Entry {
            id,
            owner: entry.owner,
            kind: entry.kind,
            delivered_at: None,
        })
    }

    /// Entries of a chat in insertion order; empty for an unknown chat.
    ///
    /// Rows that fail re-validation are logged and left out.
    pub fn list(&self, chat_id: i64) -> AppResult<Vec<Entry>> {
        let conn = get_connection(&self.pool)?;
        let raw = query_chat_entries(&conn, chat_id)?;
        drop(conn);
        Ok(raw.into_iter().filter_map(decode_or_warn).collect())
    }

    /// Every entry of every owner, each row decoded independently.
    pub fn scan(&self) -> AppResult<Vec<Scanned>> {
        let conn = get_connection(&self.pool)?;
        let raw = query_all_entries(&conn)?;
        drop(conn);
        Ok(raw.into_iter().map(RawEntry::decode).collect())
    }

    /// Every owner with their entries, owners without entries included.
    /// Ordered by username, then user id.
    pub fn list_all(&self) -> AppResult<Vec<OwnerEntries>> {
        let conn = get_connection(&self.pool)?;

        let mut stmt = conn.prepare(
            "SELECT user_id, username FROM owners
             ORDER BY username IS NULL, username COLLATE NOCASE ASC, user_id ASC",
        )?;
        let owners = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);

        let raw = query_all_entries(&conn)?;
        drop(conn);

        let mut by_user: BTreeMap<i64, Vec<Entry>> = BTreeMap::new();
        for entry in raw.into_iter().filter_map(decode_or_warn) {
            by_user.entry(entry.owner.user_id).or_default().push(entry);
        }

        Ok(owners
            .into_iter()
            .map(|(user_id, username)| OwnerEntries {
                user_id,
                username,
                entries: by_user.remove(&user_id).unwrap_or_default(),
            })
            .collect())
    }

    /// Look up one entry by id.
    pub fn get(&self, id: i64) -> AppResult<Option<Entry>> {
        let conn = get_connection(&self.pool)?;
        let raw = conn
            .query_row(&format!("{} WHERE e.id = ?1", SELECT_ENTRIES), params![id], parse_row)
            .optional()?;
        Ok(match raw {
            Some(raw) => Some(raw.decode()?),
            None => None,
        })
    }

    /// Set the delivery marker. Returns `false` if the entry was already
    /// marked or no longer exists.
    pub fn mark_delivered(&self, id: i64, at: NaiveDateTime) -> AppResult<bool> {
        let conn = get_connection(&self.pool)?;
        let changed = conn.execute(
            "UPDATE entries SET delivered_at = ?1 WHERE id = ?2 AND delivered_at IS NULL",
            params![format_datetime(&at), id],
        )?;
        Ok(changed > 0)
    }

    /// Drop the delivery marker so the next sweep picks the entry up again.
    /// Used when a notification was marked but never reached the chat.
    pub fn clear_delivered(&self, id: i64) -> AppResult<bool> {
        let conn = get_connection(&self.pool)?;
        let changed = conn.execute(
            "UPDATE entries SET delivered_at = NULL WHERE id = ?1 AND delivered_at IS NOT NULL",
            params![id],
        )?;
        Ok(changed > 0)
    }

    /// Delete one entry belonging to `chat_id`. Returns `false` if nothing matched.
    pub fn delete(&self, chat_id: i64, id: i64) -> AppResult<bool> {
        let conn = get_connection(&self.pool)?;
        let changed = conn.execute(
            "DELETE FROM entries WHERE id = ?1 AND chat_id = ?2",
            params![id, chat_id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, EntryStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.db");
        let store = EntryStore::open(path.to_str().unwrap()).unwrap();
        (dir, store)
    }

    fn owner(chat_id: i64, user_id: i64) -> Owner {
        Owner::new(chat_id, user_id).with_username(Some(format!("user{}", user_id)))
    }

    fn birthday(name: &str) -> EntryKind {
        EntryKind::Birthday(BirthdayEntry {
            name: name.to_string(),
            birthday_date: NaiveDate::from_ymd_opt(2030, 2, 28).unwrap(),
            reminder_lead: 10,
            gifts: "book".to_string(),
            note: "none".to_string(),
        })
    }

    fn reminder(text: &str) -> EntryKind {
        EntryKind::Reminder(ReminderEntry {
            text: text.to_string(),
            remind_at: NaiveDate::from_ymd_opt(2030, 5, 1).unwrap().and_hms_opt(9, 0, 0).unwrap(),
        })
    }

    // ── put / list ───────────────────────────────────────────────────────────

    #[test]
    fn put_then_list_keeps_insertion_order() {
        let (_dir, store) = temp_store();
        store.put(NewEntry { owner: owner(1, 10), kind: birthday("Alice") }).unwrap();
        store.put(NewEntry { owner: owner(1, 10), kind: reminder("Call mom") }).unwrap();
        store.put(NewEntry { owner: owner(1, 10), kind: birthday("Alice") }).unwrap();

        let listed = store.list(1).unwrap();
        assert_eq!(listed.len(), 3, "duplicates are allowed");
        assert_eq!(listed[0].kind, birthday("Alice"));
        assert_eq!(listed[1].kind, reminder("Call mom"));
        assert!(listed[0].id < listed[1].id && listed[1].id < listed[2].id);
    }

    #[test]
    fn list_unknown_chat_is_empty() {
        let (_dir, store) = temp_store();
        assert!(store.list(404).unwrap().is_empty());
    }

    #[test]
    fn list_is_scoped_to_chat() {
        let (_dir, store) = temp_store();
        store.put(NewEntry { owner: owner(1, 10), kind: reminder("mine") }).unwrap();
        store.put(NewEntry { owner: owner(2, 20), kind: reminder("theirs") }).unwrap();

        let listed = store.list(2).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].owner.user_id, 20);
        assert_eq!(listed[0].owner.username.as_deref(), Some("user20"));
    }

    #[test]
    fn put_returns_stored_entry() {
        let (_dir, store) = temp_store();
        let stored = store.put(NewEntry { owner: owner(1, 10), kind: reminder("x") }).unwrap();
        assert_eq!(store.get(stored.id).unwrap(), Some(stored));
    }

    // ── scan ─────────────────────────────────────────────────────────────────

    #[test]
    fn scan_covers_all_owners() {
        let (_dir, store) = temp_store();
        store.put(NewEntry { owner: owner(1, 10), kind: reminder("a") }).unwrap();
        store.put(NewEntry { owner: owner(2, 20), kind: birthday("b") }).unwrap();

        let scanned = store.scan().unwrap();
        assert_eq!(scanned.len(), 2);
        assert!(scanned.iter().all(Result::is_ok));
    }

    #[test]
    fn scan_reports_corrupt_rows_individually() {
        let (_dir, store) = temp_store();
        let good = store.put(NewEntry { owner: owner(1, 10), kind: birthday("ok") }).unwrap();
        let bad = store.put(NewEntry { owner: owner(1, 10), kind: birthday("bad") }).unwrap();

        let conn = get_connection(store.pool()).unwrap();
        conn.execute("UPDATE entries SET due_at = '31-02-2030' WHERE id = ?1", params![bad.id])
            .unwrap();
        drop(conn);

        let scanned = store.scan().unwrap();
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0].as_ref().map(|e| e.id), Ok(good.id));
        assert!(matches!(
            scanned[1],
            Err(EntryDecodeError::BadTimestamp { id, .. }) if id == bad.id
        ));

        // Listing skips the bad row instead of failing
        assert_eq!(store.list(1).unwrap().len(), 1);
    }

    #[test]
    fn lead_days_stored_as_text_are_revalidated() {
        let (_dir, store) = temp_store();
        let entry = store.put(NewEntry { owner: owner(1, 10), kind: birthday("x") }).unwrap();

        let conn = get_connection(store.pool()).unwrap();
        conn.execute("UPDATE entries SET lead_days = ' 7 ' WHERE id = ?1", params![entry.id])
            .unwrap();
        drop(conn);
        match store.get(entry.id).unwrap().unwrap().kind {
            EntryKind::Birthday(b) => assert_eq!(b.reminder_lead, 7),
            other => panic!("unexpected kind {:?}", other),
        }

        let conn = get_connection(store.pool()).unwrap();
        conn.execute("UPDATE entries SET lead_days = 'soon' WHERE id = ?1", params![entry.id])
            .unwrap();
        drop(conn);
        assert!(matches!(
            store.scan().unwrap()[0],
            Err(EntryDecodeError::BadLeadDays { .. })
        ));
    }

    // ── list_all ─────────────────────────────────────────────────────────────

    #[test]
    fn list_all_includes_owners_without_entries() {
        let (_dir, store) = temp_store();
        store.register_owner(&owner(3, 30)).unwrap();
        store.put(NewEntry { owner: owner(1, 10), kind: reminder("a") }).unwrap();
        store.put(NewEntry { owner: owner(1, 10), kind: reminder("b") }).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].username.as_deref(), Some("user10"));
        assert_eq!(all[0].entries.len(), 2);
        assert_eq!(all[1].user_id, 30);
        assert!(all[1].entries.is_empty());
    }

    #[test]
    fn owner_upsert_keeps_known_username() {
        let (_dir, store) = temp_store();
        store.register_owner(&owner(1, 10)).unwrap();
        store.register_owner(&Owner::new(1, 10)).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all[0].username.as_deref(), Some("user10"));
    }

    // ── mark_delivered / delete ──────────────────────────────────────────────

    #[test]
    fn mark_delivered_only_once() {
        let (_dir, store) = temp_store();
        let entry = store.put(NewEntry { owner: owner(1, 10), kind: reminder("a") }).unwrap();
        let at = NaiveDate::from_ymd_opt(2030, 5, 1).unwrap().and_hms_opt(9, 1, 0).unwrap();

        assert!(store.mark_delivered(entry.id, at).unwrap());
        assert!(!store.mark_delivered(entry.id, at).unwrap());
        assert_eq!(store.get(entry.id).unwrap().unwrap().delivered_at, Some(at));
    }

    #[test]
    fn clear_delivered_makes_entry_pending_again() {
        let (_dir, store) = temp_store();
        let entry = store.put(NewEntry { owner: owner(1, 10), kind: reminder("a") }).unwrap();
        let at = NaiveDate::from_ymd_opt(2030, 5, 1).unwrap().and_hms_opt(9, 1, 0).unwrap();

        assert!(!store.clear_delivered(entry.id).unwrap());
        store.mark_delivered(entry.id, at).unwrap();
        assert!(store.clear_delivered(entry.id).unwrap());
        assert_eq!(store.get(entry.id).unwrap().unwrap().delivered_at, None);
        assert!(store.mark_delivered(entry.id, at).unwrap());
    }

    #[test]
    fn delete_requires_matching_chat() {
        let (_dir, store) = temp_store();
        let entry = store.put(NewEntry { owner: owner(1, 10), kind: reminder("a") }).unwrap();

        assert!(!store.delete(2, entry.id).unwrap());
        assert!(store.delete(1, entry.id).unwrap());
        assert!(store.list(1).unwrap().is_empty());
    }
}
