//! Telegram-facing layer: bot setup, keyboards, callback payloads, and the
//! dispatcher handler tree.

pub mod action;
pub mod bot;
pub mod calendar;
pub mod cleanup;
pub mod handlers;
pub mod keyboards;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
