//! Command handlers (/start, /birthday, /list, ...)

use teloxide::prelude::*;
use teloxide::types::Message;

use remindcore::config;
use remindcore::EntryVariant;

use super::types::{message_lang, owner_from_message, sender_id, HandlerDeps, HandlerError};
use crate::i18n;
use crate::telegram::bot::help_text;
use crate::telegram::{render, Bot};

pub async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let lang = message_lang(msg);
    if let Some(owner) = owner_from_message(msg) {
        if let Err(e) = deps.store().register_owner(&owner) {
            log::warn!("Failed to register owner {}: {}", owner.user_id, e);
        }
    }
    bot.send_message(msg.chat.id, i18n::t(&lang, "start.welcome")).await?;
    Ok(())
}

pub async fn handle_help_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, help_text(&message_lang(msg))).await?;
    Ok(())
}

/// `/birthday` and `/remind`: start collecting a new entry
pub async fn handle_begin_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    variant: EntryVariant,
) -> Result<(), HandlerError> {
    let Some(owner) = owner_from_message(msg) else {
        log::warn!("Ignoring /{} without sender in chat {}", variant, msg.chat.id);
        return Ok(());
    };

    let lang = message_lang(msg);
    let prompt = deps
        .engine
        .begin(owner, variant, chrono::Local::now().naive_local());
    bot.send_message(msg.chat.id, i18n::t(&lang, prompt.key())).await?;
    Ok(())
}

pub async fn handle_list_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let lang = message_lang(msg);
    let text = match deps.store().list(msg.chat.id.0) {
        Ok(entries) => render::list(&lang, &entries),
        Err(e) => {
            log::error!("Failed to list entries for chat {}: {}", msg.chat.id, e);
            i18n::t(&lang, "errors.generic")
        }
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// `/all`: every owner with their entries, admins only
pub async fn handle_all_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let lang = message_lang(msg);
    let user_id = sender_id(msg).unwrap_or(0);

    if !config::admin::is_admin(user_id) {
        log::warn!("User {} tried /all without admin rights", user_id);
        bot.send_message(msg.chat.id, i18n::t(&lang, "admin.denied")).await?;
        return Ok(());
    }

    let text = match deps.store().list_all() {
        Ok(owners) => render::admin_listing(&lang, &owners),
        Err(e) => {
            log::error!("Failed to list all entries: {}", e);
            i18n::t(&lang, "errors.generic")
        }
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

pub async fn handle_cancel_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let lang = message_lang(msg);
    let cancelled = sender_id(msg).is_some_and(|user_id| deps.engine.cancel(user_id));
    let key = if cancelled {
        "conversation.cancelled"
    } else {
        "conversation.nothing_to_cancel"
    };
    bot.send_message(msg.chat.id, i18n::t(&lang, key)).await?;
    Ok(())
}

/// `/delete <n>`: remove the n-th entry of this chat's `/list`
pub async fn handle_delete_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    arg: &str,
) -> Result<(), HandlerError> {
    let lang = message_lang(msg);
    let chat_id = msg.chat.id.0;

    let Some(index) = parse_list_number(arg) else {
        bot.send_message(msg.chat.id, i18n::t(&lang, "delete.usage")).await?;
        return Ok(());
    };

    let key = match delete_nth(deps, chat_id, index) {
        Ok(true) => "delete.done",
        Ok(false) => "delete.not_found",
        Err(e) => {
            log::error!("Failed to delete entry #{} in chat {}: {}", index, chat_id, e);
            "errors.generic"
        }
    };
    bot.send_message(msg.chat.id, i18n::t(&lang, key)).await?;
    Ok(())
}

fn parse_list_number(arg: &str) -> Option<usize> {
    arg.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn delete_nth(deps: &HandlerDeps, chat_id: i64, index: usize) -> remindcore::AppResult<bool> {
    let entries = deps.store().list(chat_id)?;
    match entries.get(index - 1) {
        Some(entry) => {
            let deleted = deps.store().delete(chat_id, entry.id)?;
            if deleted {
                log::info!("Deleted entry {} in chat {}", entry.id, chat_id);
            }
            Ok(deleted)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remindcore::{ConversationEngine, EntryKind, EntryStore, NewEntry, Owner, ReminderEntry};
    use std::sync::Arc;

    fn deps() -> (tempfile::TempDir, HandlerDeps) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.db");
        let store = EntryStore::open(path.to_str().unwrap()).unwrap();
        (dir, HandlerDeps::new(Arc::new(ConversationEngine::new(store))))
    }

    fn add_reminder(deps: &HandlerDeps, text: &str) -> i64 {
        deps.store()
            .put(NewEntry {
                owner: Owner::new(1, 1),
                kind: EntryKind::Reminder(ReminderEntry {
                    text: text.to_string(),
                    remind_at: chrono::NaiveDate::from_ymd_opt(2030, 1, 1)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap(),
                }),
            })
            .unwrap()
            .id
    }

    #[test]
    fn list_numbers_start_at_one() {
        assert_eq!(parse_list_number(" 2 "), Some(2));
        assert_eq!(parse_list_number("0"), None);
        assert_eq!(parse_list_number("-1"), None);
        assert_eq!(parse_list_number(""), None);
    }

    #[test]
    fn delete_nth_uses_listing_order() {
        let (_dir, deps) = deps();
        add_reminder(&deps, "first");
        let second = add_reminder(&deps, "second");
        add_reminder(&deps, "third");

        assert!(delete_nth(&deps, 1, 2).unwrap());
        let remaining: Vec<_> = deps.store().list(1).unwrap().into_iter().map(|e| e.id).collect();
        assert!(!remaining.contains(&second));
        assert_eq!(remaining.len(), 2);

        assert!(!delete_nth(&deps, 1, 5).unwrap());
        assert!(!delete_nth(&deps, 2, 1).unwrap(), "other chats are untouched");
    }
}
