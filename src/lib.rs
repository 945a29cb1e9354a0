//! Lost & Found Telegram bot.
//!
//! Users report found items through a short photo/category form; the
//! confirmed report lands on a public feed channel and pings everyone
//! subscribed to the item's category. Losers of things search the feed by
//! category and recency, or file their own lost-item report. Admins can
//! claim, unclaim, and delete posts, and broadcast to all users.

pub mod broadcast;
pub mod categories;
pub mod conversation;
pub mod core;
pub mod flow;
pub mod gateway;
pub mod moderation;
pub mod render;
pub mod storage;
pub mod submit;
pub mod telegram;
