//! Multi-turn input collection.
//!
//! A conversation is started by a command (`begin`) and then consumes one
//! message per step until the entry is complete:
//!
//! - birthday: name → date → lead days → gifts → note
//! - reminder: text → date-time

pub mod engine;
pub mod state;
pub mod validation;

pub use engine::{ConversationEngine, Reply};
pub use state::{BirthdayDraft, ConversationState, Draft, Prompt, ReminderDraft, Step, Transition};
pub use validation::ValidationError;
