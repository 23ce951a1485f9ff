//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command menu setup (default Russian menu plus localized ones)

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ChatKind, Message};
use teloxide::utils::command::BotCommands;
use unic_langid::LanguageIdentifier;

use remindcore::config;

use crate::i18n;
use crate::telegram::Bot;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "начать работу")]
    Start,
    #[command(description = "список команд")]
    Help,
    #[command(description = "добавить день рождения")]
    Birthday,
    #[command(description = "добавить напоминание")]
    Remind,
    #[command(description = "мои напоминания")]
    List,
    #[command(description = "все пользователи и их напоминания (только для администратора)")]
    All,
    #[command(description = "отменить текущий ввод")]
    Cancel,
    #[command(description = "удалить напоминание по номеру из /list")]
    Delete(String),
}

/// Command names in menu order, paired with their Fluent attribute.
const MENU: &[(&str, &str)] = &[
    ("start", "commands.start"),
    ("help", "commands.help"),
    ("birthday", "commands.birthday"),
    ("remind", "commands.remind"),
    ("list", "commands.list"),
    ("cancel", "commands.cancel"),
    ("delete", "commands.delete"),
    ("all", "commands.all"),
];

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Missing token, invalid URL or HTTP client failure
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::bot_token()?;
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;

    // Check if local Bot API server is configured
    let bot = if let Some(ref bot_api_url) = *config::BOT_API_URL {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        Bot::with_client(token, client).set_api_url(url)
    } else {
        Bot::with_client(token, client)
    };

    Ok(bot)
}

/// Command menu entries for a language
pub fn localized_commands(lang: &LanguageIdentifier) -> Vec<BotCommand> {
    MENU.iter()
        .map(|(command, key)| BotCommand::new(*command, i18n::t(lang, key)))
        .collect()
}

/// Sets up bot commands in Telegram UI, one menu per supported language
///
/// # Returns
/// * `Ok(())` - Commands set successfully
/// * `Err(RequestError)` - Failed to set commands
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(localized_commands(&i18n::lang_for(None))).await?;

    for (code, _) in i18n::SUPPORTED_LANGS {
        bot.set_my_commands(localized_commands(&i18n::lang_from_code(code)))
            .language_code(*code)
            .await?;
    }

    Ok(())
}

/// Help text: localized header followed by one line per command
pub fn help_text(lang: &LanguageIdentifier) -> String {
    let mut text = i18n::t(lang, "help.header");
    for command in localized_commands(lang) {
        text.push_str(&format!("\n/{} - {}", command.command, command.description));
    }
    text
}

/// In private chats everything the user types is meant for the bot
pub fn is_private_chat(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}
