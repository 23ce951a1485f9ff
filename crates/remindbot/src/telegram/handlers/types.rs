//! Handler types, dependencies, and message helpers

use std::sync::Arc;

use teloxide::types::Message;
use unic_langid::LanguageIdentifier;

use remindcore::{ConversationEngine, EntryStore, Owner};

use crate::i18n;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub engine: Arc<ConversationEngine>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(engine: Arc<ConversationEngine>) -> Self {
        Self { engine }
    }

    pub fn store(&self) -> &EntryStore {
        self.engine.store()
    }
}

/// Telegram user id of the sender, if the message has one
pub fn sender_id(msg: &Message) -> Option<i64> {
    msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok())
}

/// Owner identity (chat + sender) for entries created from this message
pub fn owner_from_message(msg: &Message) -> Option<Owner> {
    let user_id = sender_id(msg)?;
    let from = msg.from.as_ref()?;
    Some(
        Owner::new(msg.chat.id.0, user_id)
            .with_username(from.username.clone())
            .with_language(from.language_code.clone()),
    )
}

/// Language to answer this message in
pub fn message_lang(msg: &Message) -> LanguageIdentifier {
    i18n::lang_for(msg.from.as_ref().and_then(|u| u.language_code.as_deref()))
}
