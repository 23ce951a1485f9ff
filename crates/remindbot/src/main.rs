use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep};

use remindcore::core::{init_logger, log_startup_configuration};
use remindcore::export::export_store;
use remindcore::scheduler::{collect_due, run_sweep, start_scheduler};
use remindcore::{config, ConversationEngine, EntryStore};
use remindbot::cli::{Cli, Commands};
use remindbot::telegram::notifications::deliver;
use remindbot::telegram::{create_bot, schema, setup_bot_commands, start_notification_dispatcher, HandlerDeps};

/// Main entry point for the reminder bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics in handler tasks instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Load environment variables from .env if present (before any config is read)
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH, *config::LOG_LEVEL)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_bot().await,
        Commands::Sweep { dry_run } => sweep_once(dry_run).await,
        Commands::Export { chat } => {
            let store = EntryStore::open(&config::DATABASE_PATH)?;
            println!("{}", export_store(&store, chat)?);
            Ok(())
        }
    }
}

/// Runs the bot: dispatcher, sweep scheduler, notification dispatcher and
/// (when a TTL is configured) the stale conversation purge.
async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");
    log_startup_configuration();

    let bot = create_bot()?;

    // Retry while a local Bot API server is still starting
    let bot_info = {
        let startup_max_retries = 60; // Up to 5 minutes (60 * 5s)
        let mut startup_retry = 0;
        loop {
            match bot.get_me().await {
                Ok(info) => break info,
                Err(e) => {
                    let err_str = e.to_string();
                    let is_retryable = err_str.contains("restart")
                        || err_str.contains("network")
                        || err_str.contains("connection")
                        || err_str.contains("timed out");

                    startup_retry += 1;
                    if startup_retry >= startup_max_retries || !is_retryable {
                        return Err(anyhow::anyhow!(
                            "Failed to connect to Bot API after {} retries: {}",
                            startup_retry,
                            e
                        ));
                    }

                    log::warn!(
                        "Bot API not ready (attempt {}/{}): {}. Retrying in 5 seconds...",
                        startup_retry,
                        startup_max_retries,
                        err_str
                    );
                    sleep(Duration::from_secs(5)).await;
                }
            }
        }
    };
    log::info!("Bot username: {:?}, Bot ID: {}", bot_info.username, bot_info.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let store = EntryStore::open(&config::DATABASE_PATH)?;
    let engine = Arc::new(ConversationEngine::new(store.clone()).with_ttl(config::conversation::ttl()));

    let notifications = start_scheduler(
        store.clone(),
        *config::scheduler::MATCH_POLICY,
        config::scheduler::interval(),
    );
    start_notification_dispatcher(bot.clone(), store, notifications);

    if config::conversation::ttl().is_some() {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(config::conversation::PURGE_INTERVAL_SECS));
            loop {
                ticker.tick().await;
                engine.purge_expired(chrono::Local::now().naive_local());
            }
        });
    }

    let handler = schema(HandlerDeps::new(engine));
    let listener = Polling::builder(bot.clone()).build();

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

/// One sweep outside the bot loop. With `dry_run` the due entries are only
/// printed; nothing is sent or marked delivered.
async fn sweep_once(dry_run: bool) -> Result<()> {
    let store = EntryStore::open(&config::DATABASE_PATH)?;
    let policy = *config::scheduler::MATCH_POLICY;
    let now = chrono::Local::now().naive_local();

    if dry_run {
        let (due, report) = collect_due(&store, policy, now)?;
        println!("{}", serde_json::to_string_pretty(&due)?);
        log::info!(
            "Dry run: {} of {} entries due ({} undecodable)",
            report.due,
            report.scanned,
            report.failures
        );
        return Ok(());
    }

    let bot = create_bot()?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let report = run_sweep(&store, policy, now, &tx)?;
    drop(tx);

    let mut sent = 0;
    let mut failed = report.failures;
    while let Some(notification) = rx.recv().await {
        if deliver(&bot, &store, &notification).await {
            sent += 1;
        } else {
            failed += 1;
        }
    }

    log::info!(
        "Sweep finished: {} due, {} sent, {} failed",
        report.due,
        sent,
        failed
    );
    Ok(())
}
