//! remindcore - storage, conversation engine and sweep scheduler for the reminder bot
//!
//! This library holds everything that does not need Telegram: the entry model,
//! the SQLite-backed entry store, the per-user conversation state machine and
//! the periodic sweep that decides which entries are due.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging
//! - `entry`: birthday / reminder entry model and input formats
//! - `storage`: connection pool, migrations, `EntryStore`
//! - `conversation`: step-by-step input collection (`ConversationEngine`)
//! - `scheduler`: due-entry matching and the background sweep
//! - `export`: JSON export of stored entries

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod conversation;
pub mod core;
pub mod entry;
pub mod export;
pub mod scheduler;
pub mod storage;

// Re-export commonly used types for convenience
pub use conversation::{ConversationEngine, Prompt, Reply, Step, ValidationError};
pub use core::{config, AppError, AppResult};
pub use entry::{BirthdayEntry, Entry, EntryKind, EntryVariant, NewEntry, Owner, ReminderEntry};
pub use scheduler::{DueNotification, MatchPolicy, SweepReport};
pub use storage::{create_pool, get_connection, DbConnection, DbPool, EntryStore};
