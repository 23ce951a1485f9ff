//! Delivery of scheduled notifications to the chats they belong to.

use teloxide::prelude::*;
use teloxide::RequestError;
use tokio::sync::mpsc;

use remindcore::{DueNotification, EntryStore};

use crate::i18n;
use crate::telegram::{render, Bot};

/// Start the notification dispatcher that receives `DueNotification`s
/// and sends formatted Telegram messages.
pub fn start_notification_dispatcher(bot: Bot, store: EntryStore, mut rx: mpsc::UnboundedReceiver<DueNotification>) {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            deliver(&bot, &store, &notification).await;
        }
        log::warn!("Notification dispatcher channel closed");
    });
}

/// Send one notification.
///
/// On a transient failure the delivery marker is cleared so the next sweep
/// sends it again. A chat that blocked the bot keeps the marker.
pub async fn deliver(bot: &Bot, store: &EntryStore, notification: &DueNotification) -> bool {
    let owner = &notification.entry.owner;
    let lang = i18n::lang_for(owner.language_code.as_deref());
    let text = render::notification(&lang, notification);

    match bot.send_message(ChatId(owner.chat_id), text).await {
        Ok(_) => {
            log::info!(
                "Sent {} notification for entry {} to chat {}",
                notification.entry.variant(),
                notification.entry.id,
                owner.chat_id
            );
            true
        }
        Err(e) => {
            if handle_send_error(&e, owner.chat_id) {
                release_for_retry(store, notification.entry.id);
            }
            false
        }
    }
}

/// Log a send error. Returns `true` when the send is worth retrying.
fn handle_send_error(err: &RequestError, chat_id: i64) -> bool {
    if is_blocked_error(&err.to_string()) {
        log::warn!("Bot blocked in chat {}, notification dropped", chat_id);
        return false;
    }

    let retry = is_transient(err);
    log::error!(
        "Failed to send notification to {}: {}{}",
        chat_id,
        err,
        if retry { " (will retry)" } else { "" }
    );
    retry
}

fn is_blocked_error(err_str: &str) -> bool {
    err_str.contains("Forbidden") || err_str.contains("blocked") || err_str.contains("deactivated")
}

/// Network trouble, rate limits and Bot API server errors.
fn is_transient(err: &RequestError) -> bool {
    match err {
        RequestError::Network(_) | RequestError::RetryAfter(_) | RequestError::Io(_) => true,
        RequestError::Api(api) => {
            let text = api.to_string();
            text.contains("Internal Server Error") || text.contains("Bad Gateway") || text.contains("restart")
        }
        _ => false,
    }
}

fn release_for_retry(store: &EntryStore, id: i64) {
    match store.clear_delivered(id) {
        Ok(true) => log::info!("Entry {} will be retried on the next sweep", id),
        Ok(false) => {}
        Err(e) => log::error!("Failed to clear delivery marker of entry {}: {}", id, e),
    }
}
