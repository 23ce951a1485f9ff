use chrono::{Duration, NaiveDateTime};
use dashmap::DashMap;

use super::state::{ConversationState, Draft, Prompt, Step, Transition};
use super::validation::ValidationError;
use crate::core::error::AppResult;
use crate::entry::{Entry, EntryVariant, NewEntry, Owner};
use crate::storage::EntryStore;

/// Outcome of one inbound message inside an active conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Field accepted, ask for the next one
    Prompt(Prompt),
    /// Field rejected, same question again
    Invalid { error: ValidationError, reprompt: Prompt },
    /// Last field accepted and the entry stored
    Completed(Entry),
}

/// Per-user step sequencer.
///
/// Holds at most one conversation per user id. The final step hands the
/// collected entry to the [`EntryStore`]; if that write fails the
/// conversation stays on its final step so the same answer can be resent.
pub struct ConversationEngine {
    sessions: DashMap<i64, ConversationState>,
    store: EntryStore,
    ttl: Option<Duration>,
}

impl ConversationEngine {
    pub fn new(store: EntryStore) -> Self {
        Self {
            sessions: DashMap::new(),
            store,
            ttl: None,
        }
    }

    /// Drop conversations idle for longer than `ttl`.
    pub fn with_ttl(mut self, ttl: Option<std::time::Duration>) -> Self {
        self.ttl = ttl.and_then(|ttl| Duration::from_std(ttl).ok());
        self
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    /// Start a conversation, discarding whatever the user had in progress.
    pub fn begin(&self, owner: Owner, variant: EntryVariant, now: NaiveDateTime) -> Prompt {
        // The owner row is written again together with the entry, so a failure here is not fatal
        if let Err(e) = self.store.register_owner(&owner) {
            log::warn!("Failed to register owner {}: {}", owner.user_id, e);
        }

        let user_id = owner.user_id;
        let state = ConversationState::new(owner, variant, now);
        let prompt = state.step().prompt();
        if let Some(previous) = self.sessions.insert(user_id, state) {
            log::debug!(
                "User {} restarted, dropped {} conversation at {}",
                user_id,
                previous.draft.variant(),
                previous.step()
            );
        }
        log::info!("User {} started {} entry", user_id, variant);
        prompt
    }

    /// Route one message to the user's active step.
    ///
    /// Returns `Ok(None)` when the user has no (unexpired) conversation.
    pub fn handle_text(&self, user_id: i64, text: &str, now: NaiveDateTime) -> AppResult<Option<Reply>> {
        let Some((_, mut state)) = self.sessions.remove(&user_id) else {
            return Ok(None);
        };

        if self.is_expired(&state, now) {
            log::info!("Conversation of user {} expired at {}", user_id, state.step());
            return Ok(None);
        }
        state.last_activity = now;

        match state.draft.advance(text) {
            Err(error) => {
                let reprompt = state.step().prompt();
                log::debug!("User {} sent invalid input at {}: {}", user_id, state.step(), error);
                self.restore(user_id, state);
                Ok(Some(Reply::Invalid { error, reprompt }))
            }
            Ok(Transition::Next(draft)) => {
                state.draft = draft;
                let prompt = state.step().prompt();
                self.restore(user_id, state);
                Ok(Some(Reply::Prompt(prompt)))
            }
            Ok(Transition::Complete(kind)) => {
                let new_entry = NewEntry {
                    owner: state.owner.clone(),
                    kind,
                };
                match self.store.put(new_entry) {
                    Ok(entry) => {
                        log::info!("User {} completed {} entry {}", user_id, entry.variant(), entry.id);
                        Ok(Some(Reply::Completed(entry)))
                    }
                    Err(e) => {
                        log::error!("Failed to store entry for user {}: {}", user_id, e);
                        self.restore(user_id, state);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Drop the user's conversation. Returns `false` if there was none.
    pub fn cancel(&self, user_id: i64) -> bool {
        self.sessions.remove(&user_id).is_some()
    }

    pub fn active_step(&self, user_id: i64) -> Option<Step> {
        self.sessions.get(&user_id).map(|state| state.step())
    }

    /// Chat the user's conversation was started in.
    pub fn active_chat(&self, user_id: i64) -> Option<i64> {
        self.sessions.get(&user_id).map(|state| state.owner.chat_id)
    }

    pub fn draft(&self, user_id: i64) -> Option<Draft> {
        self.sessions.get(&user_id).map(|state| state.draft.clone())
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Remove every expired conversation. Returns how many were dropped.
    pub fn purge_expired(&self, now: NaiveDateTime) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let before = self.sessions.len();
        self.sessions.retain(|_, state| !self.is_expired(state, now));
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            log::info!("Purged {} expired conversations", purged);
        }
        purged
    }

    fn is_expired(&self, state: &ConversationState, now: NaiveDateTime) -> bool {
        match self.ttl {
            Some(ttl) => now - state.last_activity > ttl,
            None => false,
        }
    }

    // A `begin` that raced this message wins over the state being put back
    fn restore(&self, user_id: i64, state: ConversationState) {
        self.sessions.entry(user_id).or_insert(state);
    }
}
