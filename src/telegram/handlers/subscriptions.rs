//! Subscription management: the /notification menu and its buttons.

use teloxide::prelude::*;
use teloxide::types::MessageId;

use crate::categories::Category;
use crate::core::config;
use crate::storage::db;
use crate::telegram::handlers::{HandlerDeps, HandlerError};
use crate::telegram::{cleanup, keyboards};

/// The subscribe button: show the category grid.
pub async fn show_subscribe_grid(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<i32>,
) -> Result<(), HandlerError> {
    let text = "📂 Pick a category to get notified about:";
    match message_id {
        Some(id) => {
            bot.edit_message_text(chat_id, MessageId(id), text)
                .reply_markup(keyboards::subscribe_categories())
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .reply_markup(keyboards::subscribe_categories())
                .await?;
        }
    }
    Ok(())
}

/// A category picked from the subscribe grid.
pub async fn subscribe(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    menu_message_id: Option<i32>,
    category: Category,
) -> Result<(), HandlerError> {
    {
        let conn = db::get_connection(&deps.db_pool)?;
        db::subscribe(&conn, user_id, category.slug())?;
    }
    log::info!("User {} subscribed to {}", user_id, category.slug());
    deps.conversations.clear(user_id);

    if let Some(id) = menu_message_id {
        cleanup::delete_msg(bot, chat_id, id).await;
    }
    let sent = bot
        .send_message(
            chat_id,
            format!("🔔 You will be notified when something in {} is found.", category.label()),
        )
        .await?;
    cleanup::delete_after_delay(bot.clone(), chat_id, sent.id.0, config::cleanup::notice_delay());
    Ok(())
}

/// The unsubscribe button: list the user's active subscriptions.
pub async fn show_unsubscribe_list(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    message_id: Option<i32>,
) -> Result<(), HandlerError> {
    let subscribed = subscriptions_of(deps, user_id)?;
    if subscribed.is_empty() {
        if let Some(id) = message_id {
            cleanup::delete_msg(bot, chat_id, id).await;
        }
        let sent = bot
            .send_message(chat_id, "You have no active subscriptions.")
            .await?;
        cleanup::delete_after_delay(bot.clone(), chat_id, sent.id.0, config::cleanup::notice_delay());
        return Ok(());
    }

    let text = "🔕 Tap a category to stop its notifications:";
    match message_id {
        Some(id) => {
            bot.edit_message_text(chat_id, MessageId(id), text)
                .reply_markup(keyboards::unsubscribe_list(&subscribed))
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .reply_markup(keyboards::unsubscribe_list(&subscribed))
                .await?;
        }
    }
    Ok(())
}

/// One category removed; re-render the remaining list in place.
pub async fn unsubscribe(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    message_id: Option<i32>,
    category: Category,
) -> Result<(), HandlerError> {
    {
        let conn = db::get_connection(&deps.db_pool)?;
        db::unsubscribe(&conn, user_id, category.slug())?;
    }
    log::info!("User {} unsubscribed from {}", user_id, category.slug());

    let remaining = subscriptions_of(deps, user_id)?;
    let Some(id) = message_id else {
        return Ok(());
    };
    if remaining.is_empty() {
        bot.edit_message_text(chat_id, MessageId(id), "🔕 All notifications are off.")
            .await?;
        cleanup::delete_after_delay(bot.clone(), chat_id, id, config::cleanup::notice_delay());
    } else {
        bot.edit_message_reply_markup(chat_id, MessageId(id))
            .reply_markup(keyboards::unsubscribe_list(&remaining))
            .await?;
    }
    Ok(())
}

/// The done button under the unsubscribe list.
pub async fn finish_unsubscribe(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<i32>,
) -> Result<(), HandlerError> {
    if let Some(id) = message_id {
        cleanup::delete_msg(bot, chat_id, id).await;
    }
    Ok(())
}

/// The delete button under a subscriber notification.
pub async fn dismiss_notification(
    bot: &Bot,
    chat_id: ChatId,
    message_id: i32,
) -> Result<(), HandlerError> {
    cleanup::delete_msg(bot, chat_id, message_id).await;
    Ok(())
}

fn subscriptions_of(deps: &HandlerDeps, user_id: i64) -> Result<Vec<Category>, HandlerError> {
    let conn = db::get_connection(&deps.db_pool)?;
    let slugs = db::get_subscriptions(&conn, user_id)?;
    Ok(slugs.iter().filter_map(|s| Category::from_slug(s)).collect())
}
