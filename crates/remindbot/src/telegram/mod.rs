//! Telegram dispatch facade: command routing, rendering, notification delivery

pub mod bot;
pub mod handlers;
pub mod notifications;
pub mod render;

pub type Bot = teloxide::Bot;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use notifications::start_notification_dispatcher;
