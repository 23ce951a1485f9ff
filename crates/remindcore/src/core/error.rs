use thiserror::Error;

use crate::entry::EntryDecodeError;

/// Centralized error types for the application
///
/// Store failures (`Database`, `DatabasePool`, `Migration`) abort only the
/// operation that hit them; the Telegram layer turns them into a generic
/// "try again" reply and never shows the details to users.
///
/// # Example
///
/// ```no_run
/// use remindcore::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] refinery::Error),

    /// A stored row that no longer parses into an entry
    #[error("Corrupt entry: {0}")]
    Decode(#[from] EntryDecodeError),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Required startup configuration is absent
    #[error("Missing configuration: {0} is not set")]
    ConfigMissing(&'static str),
}

impl AppError {
    /// True for errors caused by the entry store being unreachable or failing.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::DatabasePool(_) | AppError::Migration(_)
        )
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_flagged_as_unavailable() {
        let err = AppError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.is_store_unavailable());

        let err = AppError::ConfigMissing("BOT_TOKEN");
        assert!(!err.is_store_unavailable());
        assert_eq!(err.to_string(), "Missing configuration: BOT_TOKEN is not set");
    }
}
