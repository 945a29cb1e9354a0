//! Command entry points and the help screens.

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};

use crate::conversation::{ConversationData, ConversationState, FlowFields, FlowKind};
use crate::core::config;
use crate::storage::db;
use crate::telegram::action::HelpTopic;
use crate::telegram::bot::Command;
use crate::telegram::handlers::{admin, form, HandlerDeps, HandlerError};
use crate::telegram::{calendar, cleanup, keyboards};

const WELCOME: &str = "👋 <b>Welcome to the Lost &amp; Found bot!</b>\n\n\
    Found something? Report it with /found and it goes to the public feed.\n\
    Lost something? /lost lets you search the feed or post a report.\n\
    Want a ping when something in your category turns up? /notification.\n\n\
    /help explains everything in detail.";

const HELP_OVERVIEW: &str = "ℹ️ <b>How this works</b>\n\n\
    Every found item is posted to the public feed with a photo, a category \
    and where it was found. Pick a topic below to learn more.";

/// Dispatch one bot command.
pub async fn handle_command(
    bot: &Bot,
    deps: &HandlerDeps,
    msg: &Message,
    cmd: Command,
) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let Some(user_id) = msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()) else {
        return Ok(());
    };

    // Any command abandons whatever flow was in progress.
    deps.conversations.clear(user_id);

    match cmd {
        Command::Start => {
            if let Ok(conn) = db::get_connection(&deps.db_pool) {
                if let Err(e) = db::register_user(&conn, user_id) {
                    log::warn!("Could not register user {}: {}", user_id, e);
                }
            }
            bot.send_message(chat_id, WELCOME)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Help => {
            bot.send_message(chat_id, HELP_OVERVIEW)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::help_sections())
                .await?;
        }
        Command::Found => {
            form::start_form(bot, deps, chat_id, user_id, FlowKind::FoundReport).await?;
        }
        Command::Lost => {
            bot.send_message(chat_id, crate::render::lost_menu_text())
                .reply_markup(keyboards::lost_menu())
                .await?;
        }
        Command::Notification => {
            deps.conversations.start(
                user_id,
                ConversationState::AwaitNotifyAction,
                ConversationData::None,
            );
            bot.send_message(chat_id, "🔔 Manage your notifications:")
                .reply_markup(keyboards::notify_menu())
                .await?;
        }
        Command::Calendar => {
            let today = chrono::Utc::now().date_naive();
            bot.send_message(chat_id, "📅 Pick a date to see what was found that day:")
                .reply_markup(calendar::keyboard(today, 0))
                .await?;
        }
        Command::Showall => {
            if !require_admin(bot, chat_id, user_id).await {
                return Ok(());
            }
            admin::show_page(bot, deps, chat_id, user_id, crate::storage::db::ItemKind::Found, 0)
                .await?;
        }
        Command::Sendall => {
            if !require_admin(bot, chat_id, user_id).await {
                return Ok(());
            }
            deps.conversations.start(
                user_id,
                ConversationState::AwaitBroadcast,
                ConversationData::None,
            );
            bot.send_message(chat_id, "📣 Send the text or photo to broadcast to every user.")
                .await?;
        }
    }
    Ok(())
}

/// Gate an admin command. Tells non-admins off with a short-lived notice.
async fn require_admin(bot: &Bot, chat_id: ChatId, user_id: i64) -> bool {
    if config::is_admin(user_id) {
        return true;
    }
    log::info!("User {} tried an admin command", user_id);
    if let Ok(sent) = bot.send_message(chat_id, "⛔ This command is for administrators.").await {
        cleanup::delete_after_delay(bot.clone(), chat_id, sent.id.0, config::cleanup::notice_delay());
    }
    false
}

fn help_topic_text(topic: HelpTopic) -> &'static str {
    match topic {
        HelpTopic::Found => {
            "📦 <b>Found an item?</b>\n\n\
             Run /found, send a photo, pick a category, and fill in where you \
             found it. You can edit any field from the summary before \
             submitting. Once confirmed, the item is posted to the feed and \
             subscribers of that category get notified."
        }
        HelpTopic::Lost => {
            "🔎 <b>Lost an item?</b>\n\n\
             Run /lost. You can search the feed by category and how many days \
             back to look, or post a lost-item report (photo optional) so \
             finders can reach you. /calendar browses the feed by date."
        }
        HelpTopic::Notifications => {
            "🔔 <b>Notifications</b>\n\n\
             /notification lets you subscribe to categories. Whenever a found \
             item in one of your categories is posted, you get a copy \
             directly. Unsubscribe any time from the same menu."
        }
        HelpTopic::Commands => {
            "📋 <b>Commands</b>\n\n\
             /start — register and show the welcome message\n\
             /help — this screen\n\
             /found — report an item you found\n\
             /lost — search for a lost item or report it\n\
             /notification — manage category notifications\n\
             /calendar — browse found items by date"
        }
    }
}

/// Swap the help message body for the chosen section, keeping the topic
/// buttons in place.
pub async fn show_help_topic(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<i32>,
    topic: HelpTopic,
) -> Result<(), HandlerError> {
    let text = help_topic_text(topic);
    match message_id {
        Some(id) => {
            bot.edit_message_text(chat_id, MessageId(id), text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::help_sections())
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::help_sections())
                .await?;
        }
    }
    Ok(())
}

/// Re-render the calendar keyboard for a different month.
pub async fn navigate_calendar(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<i32>,
    month_offset: i32,
) -> Result<(), HandlerError> {
    let Some(id) = message_id else {
        return Ok(());
    };
    let today = chrono::Utc::now().date_naive();
    bot.edit_message_reply_markup(chat_id, MessageId(id))
        .reply_markup(calendar::keyboard(today, month_offset))
        .await?;
    Ok(())
}
