//! Database pool, schema migrations and the entry store

pub mod db;
pub mod entries;
pub mod migrations;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};
pub use entries::{EntryStore, OwnerEntries, Scanned};
