//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup block describing the effective configuration

use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;

use crate::core::config;
use crate::core::error::AppResult;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `level` - Maximum level written to both outputs
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(AppError::Io)` - The log file could not be created
///
/// A second call (logger already installed) is logged and ignored.
pub fn init_logger(log_file_path: &str, level: LevelFilter) -> AppResult<()> {
    let log_file = File::create(log_file_path)?;

    if let Err(e) = CombinedLogger::init(vec![
        TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, Config::default(), log_file),
    ]) {
        log::warn!("Logger already initialized: {}", e);
    }

    Ok(())
}

/// Logs the effective configuration at application startup
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("DATABASE_PATH: {}", config::DATABASE_PATH.as_str());
    log::info!("LOG_FILE_PATH: {}", config::LOG_FILE_PATH.as_str());
    log::info!("SWEEP_INTERVAL_SECS: {}", *config::scheduler::SWEEP_INTERVAL_SECS);
    log::info!("BIRTHDAY_MATCH_POLICY: {}", *config::scheduler::MATCH_POLICY);

    match config::conversation::ttl() {
        Some(ttl) => log::info!("CONVERSATION_TTL_SECS: {}", ttl.as_secs()),
        None => log::info!("CONVERSATION_TTL_SECS: disabled (conversations never expire)"),
    }

    if config::admin::ADMIN_IDS.is_empty() {
        log::warn!("ADMIN_IDS: not set, /all is unavailable");
    } else {
        log::info!("ADMIN_IDS: {} admin(s)", config::admin::ADMIN_IDS.len());
    }

    if let Some(ref url) = *config::BOT_API_URL {
        log::info!("BOT_API_URL: {}", url);
    }

    if config::BOT_TOKEN.trim().is_empty() {
        log::error!("BOT_TOKEN: not set, the bot cannot start");
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
