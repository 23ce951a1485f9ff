//! Update handlers: dispatcher schema, commands and conversation answers

pub mod commands;
pub mod conversation;
pub mod schema;
pub mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
