use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

use crate::core::error::{AppError, AppResult};

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: reminders.db
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "reminders.db".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Log level for console and file output
/// Read from LOG_LEVEL environment variable (error, warn, info, debug, trace)
/// Default: info
pub static LOG_LEVEL: Lazy<log::LevelFilter> = Lazy::new(|| {
    env::var("LOG_LEVEL")
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(log::LevelFilter::Info)
});

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Custom Bot API server URL (local telegram-bot-api), if any
pub static BOT_API_URL: Lazy<Option<String>> =
    Lazy::new(|| env::var("BOT_API_URL").ok().filter(|url| !url.trim().is_empty()));

/// Returns the bot token or `ConfigMissing` when neither variable is set.
pub fn bot_token() -> AppResult<String> {
    let token = BOT_TOKEN.trim();
    if token.is_empty() {
        return Err(AppError::ConfigMissing("BOT_TOKEN"));
    }
    Ok(token.to_string())
}

/// Sweep scheduler configuration
pub mod scheduler {
    use once_cell::sync::Lazy;
    use std::env;
    use std::time::Duration;

    use crate::scheduler::MatchPolicy;

    /// Seconds between two sweeps
    /// Read from SWEEP_INTERVAL_SECS environment variable
    /// Default: 60 (reminders are minute-granular)
    pub static SWEEP_INTERVAL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(60)
    });

    /// Birthday matching policy
    /// Read from BIRTHDAY_MATCH_POLICY environment variable ("exact" or "window")
    /// Default: exact
    pub static MATCH_POLICY: Lazy<MatchPolicy> = Lazy::new(|| {
        env::var("BIRTHDAY_MATCH_POLICY")
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_default()
    });

    /// Sweep interval duration
    pub fn interval() -> Duration {
        Duration::from_secs(*SWEEP_INTERVAL_SECS)
    }
}

/// Conversation configuration
pub mod conversation {
    use once_cell::sync::Lazy;
    use std::env;
    use std::time::Duration;

    /// Idle time after which an unfinished conversation is dropped
    /// Read from CONVERSATION_TTL_SECS environment variable
    /// Default: 0 (conversations never expire)
    pub static TTL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("CONVERSATION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    });

    /// Conversation TTL, `None` when expiry is disabled
    pub fn ttl() -> Option<Duration> {
        match *TTL_SECS {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// How often stale conversations are purged (in seconds)
    pub const PURGE_INTERVAL_SECS: u64 = 10 * 60;
}

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    pub(crate) fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.split([',', ' ', '\n', '\t'])
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }

    /// Admin user IDs (comma-separated)
    /// Read from ADMIN_IDS environment variable
    pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("ADMIN_IDS")
            .ok()
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default()
    });

    /// Whether the Telegram user may run privileged commands
    pub fn is_admin(user_id: i64) -> bool {
        ADMIN_IDS.contains(&user_id)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_admin_ids_accepts_mixed_separators() {
        assert_eq!(admin::parse_admin_ids("1, 2\n3\tx,,4"), vec![1, 2, 3, 4]);
        assert!(admin::parse_admin_ids("").is_empty());
    }

    #[test]
    fn network_timeout_matches_constant() {
        assert_eq!(network::timeout(), Duration::from_secs(network::REQUEST_TIMEOUT_SECS));
    }
}
