//! Best-effort message retraction.
//!
//! Deleting on-screen UI (old prompts, stale keyboards, transient notices) is
//! cosmetic. Failures are logged at debug and dropped; a message the user
//! already deleted, or one older than Telegram's 48h delete window, must
//! never break a flow.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::MessageId;

/// Delete one message, swallowing any error.
pub async fn delete_msg(bot: &Bot, chat_id: ChatId, message_id: i32) {
    if let Err(e) = bot.delete_message(chat_id, MessageId(message_id)).await {
        log::debug!("Could not delete message {} in {}: {}", message_id, chat_id, e);
    }
}

/// Delete a slot if it holds a message id, clearing the slot.
pub async fn retract(bot: &Bot, chat_id: ChatId, slot: &mut Option<i32>) {
    if let Some(message_id) = slot.take() {
        delete_msg(bot, chat_id, message_id).await;
    }
}

/// Delete a batch of messages (search results, admin listings).
pub async fn retract_all(bot: &Bot, chat_id: ChatId, ids: &mut Vec<i32>) {
    for message_id in ids.drain(..) {
        delete_msg(bot, chat_id, message_id).await;
    }
}

/// Schedule a deletion after `delay` on a detached task.
///
/// Fire-and-forget: the handler that scheduled it does not wait, and there is
/// no ordering guarantee relative to anything the user does in the meantime.
pub fn delete_after_delay(bot: Bot, chat_id: ChatId, message_id: i32, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        delete_msg(&bot, chat_id, message_id).await;
    });
}
