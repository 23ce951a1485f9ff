//! remindbot - Telegram front end for the reminder bot
//!
//! Routes commands and free text into `remindcore`'s conversation engine,
//! renders its structured results through Fluent locales and delivers the
//! notifications produced by the sweep scheduler.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod cli;
pub mod i18n;
pub mod telegram;
