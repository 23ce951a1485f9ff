//! Free-text messages: answers to the active conversation step

use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{message_lang, sender_id, HandlerDeps, HandlerError};
use crate::i18n;
use crate::telegram::bot::{help_text, is_private_chat};
use crate::telegram::{render, Bot};

/// Feed a text message to the sender's conversation and answer with the outcome.
///
/// With no conversation, private chats get a hint and groups get silence.
pub async fn handle_conversation_text(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let (Some(user_id), Some(text)) = (sender_id(msg), msg.text()) else {
        return Ok(());
    };
    let lang = message_lang(msg);

    // Unknown or malformed commands are never taken as an answer
    if text.starts_with('/') {
        if is_private_chat(msg) {
            bot.send_message(msg.chat.id, help_text(&lang)).await?;
        }
        return Ok(());
    }

    // Answers only count in the chat the conversation was started in
    if let Some(chat_id) = deps.engine.active_chat(user_id) {
        if chat_id != msg.chat.id.0 {
            if is_private_chat(msg) {
                bot.send_message(msg.chat.id, i18n::t(&lang, "conversation.other_chat")).await?;
            }
            return Ok(());
        }
    }

    let reply = match deps.engine.handle_text(user_id, text, chrono::Local::now().naive_local()) {
        Ok(Some(reply)) => render::reply(&lang, &reply),
        Ok(None) => {
            if !is_private_chat(msg) {
                return Ok(());
            }
            i18n::t(&lang, "conversation.no_active")
        }
        Err(e) => {
            log::error!("Conversation step failed for user {}: {}", user_id, e);
            i18n::t(&lang, "errors.try_again")
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
