//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use remindcore::EntryVariant;

use super::commands::{
    handle_all_command, handle_begin_command, handle_cancel_command, handle_delete_command, handle_help_command,
    handle_list_command, handle_start_command,
};
use super::conversation::handle_conversation_text;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Commands are matched first; any other text message is treated as an
/// answer to the sender's active conversation.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => handle_start_command(&bot, &msg, &deps).await?,
                    Command::Help => handle_help_command(&bot, &msg).await?,
                    Command::Birthday => handle_begin_command(&bot, &msg, &deps, EntryVariant::Birthday).await?,
                    Command::Remind => handle_begin_command(&bot, &msg, &deps, EntryVariant::Reminder).await?,
                    Command::List => handle_list_command(&bot, &msg, &deps).await?,
                    Command::All => handle_all_command(&bot, &msg, &deps).await?,
                    Command::Cancel => handle_cancel_command(&bot, &msg, &deps).await?,
                    Command::Delete(arg) => handle_delete_command(&bot, &msg, &deps, &arg).await?,
                }
                Ok(())
            }
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { handle_conversation_text(&bot, &msg, &deps).await }
        })
}
