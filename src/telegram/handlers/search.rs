//! Search flow: filter found items by category and recency, then forward the
//! matching feed posts into the user's chat.

use teloxide::prelude::*;
use teloxide::types::{MessageId, Recipient};

use crate::categories::Category;
use crate::conversation::{ConversationData, ConversationRecord, ConversationState, SearchFilter};
use crate::core::config;
use crate::storage::db::{self, ItemKind};
use crate::telegram::handlers::{HandlerDeps, HandlerError};
use crate::telegram::{cleanup, keyboards};

/// At most this many posts are forwarded per search.
const RESULT_LIMIT: usize = 10;

/// The "search found items" button on the /lost menu.
pub async fn start_filter(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    menu_message_id: Option<i32>,
) -> Result<(), HandlerError> {
    if let Some(id) = menu_message_id {
        cleanup::delete_msg(bot, chat_id, id).await;
    }

    let mut record = deps.conversations.start(
        user_id,
        ConversationState::AwaitFilterCategory,
        ConversationData::Search(SearchFilter::default()),
    );
    let sent = bot
        .send_message(chat_id, "📂 Which category are you looking for?")
        .reply_markup(keyboards::filter_categories())
        .await?;
    record.ui.last_prompt = Some(sent.id.0);
    deps.conversations.put(user_id, record);
    Ok(())
}

/// Category picked; ask for the time window next.
pub async fn pick_category(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    category: Category,
) -> Result<(), HandlerError> {
    let Some(mut record) = deps.conversations.get(user_id) else {
        return Ok(());
    };
    if record.state != ConversationState::AwaitFilterCategory {
        return Ok(());
    }
    let ConversationData::Search(ref mut filter) = record.data else {
        return Ok(());
    };
    filter.category = Some(category);
    record.state = ConversationState::AwaitFilterDays;

    cleanup::retract(bot, chat_id, &mut record.ui.last_prompt).await;
    let sent = bot
        .send_message(
            chat_id,
            "🗓 How many days back should I look? Send a number, e.g. 7.",
        )
        .await?;
    record.ui.last_prompt = Some(sent.id.0);
    deps.conversations.put(user_id, record);
    Ok(())
}

/// Free text arriving while the days prompt is up.
pub async fn handle_days_message(
    bot: &Bot,
    deps: &HandlerDeps,
    msg: &Message,
    user_id: i64,
    mut record: ConversationRecord,
) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let days = msg.text().and_then(|t| t.trim().parse::<i64>().ok());
    let Some(days @ 1..=365) = days else {
        let sent = bot
            .send_message(chat_id, "Please send a whole number of days between 1 and 365.")
            .await?;
        cleanup::delete_after_delay(bot.clone(), chat_id, sent.id.0, config::cleanup::notice_delay());
        return Ok(());
    };

    let Some(category) = (match record.data {
        ConversationData::Search(filter) => filter.category,
        _ => None,
    }) else {
        return Ok(());
    };

    let message_ids = {
        let conn = db::get_connection(&deps.db_pool)?;
        db::get_items_by_category_and_days(&conn, ItemKind::Found, category.slug(), days)?
    };

    cleanup::retract(bot, chat_id, &mut record.ui.last_prompt).await;
    show_results(
        bot,
        deps,
        chat_id,
        user_id,
        &message_ids,
        &format!("in {} over the last {} days", category.label(), days),
    )
    .await
}

/// The calendar's day button: everything found on that date.
pub async fn show_items_on_date(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    date: chrono::NaiveDate,
) -> Result<(), HandlerError> {
    let message_ids = {
        let conn = db::get_connection(&deps.db_pool)?;
        db::get_items_on_date(&conn, ItemKind::Found, &date.to_string())?
    };
    show_results(bot, deps, chat_id, user_id, &message_ids, &format!("on {}", date)).await
}

/// Forward matching feed posts and pin a hide button under them.
async fn show_results(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    message_ids: &[i64],
    scope: &str,
) -> Result<(), HandlerError> {
    if message_ids.is_empty() {
        deps.conversations.clear(user_id);
        let sent = bot
            .send_message(chat_id, format!("😕 Nothing found {}.", scope))
            .await?;
        cleanup::delete_after_delay(bot.clone(), chat_id, sent.id.0, config::cleanup::notice_delay());
        return Ok(());
    }

    let feed = Recipient::ChannelUsername(config::CHANNEL_USERNAME.clone());
    let mut record = deps.conversations.start(
        user_id,
        ConversationState::ViewingResults,
        ConversationData::None,
    );

    for &message_id in message_ids.iter().take(RESULT_LIMIT) {
        match bot
            .forward_message(chat_id, feed.clone(), MessageId(message_id as i32))
            .await
        {
            Ok(fwd) => record.ui.results.push(fwd.id.0),
            // Post removed from the channel behind the record's back.
            Err(e) => log::warn!("Could not forward feed post {}: {}", message_id, e),
        }
    }

    let shown = record.ui.results.len();
    let tail = if message_ids.len() > RESULT_LIMIT {
        format!("📋 Showing the {} most recent of {} matches {}.", shown, message_ids.len(), scope)
    } else {
        format!("📋 {} item(s) found {}.", shown, scope)
    };
    let end = bot
        .send_message(chat_id, tail)
        .reply_markup(keyboards::hide_results())
        .await?;
    record.ui.end_list = Some(end.id.0);

    deps.conversations.put(user_id, record);
    Ok(())
}

/// The hide button: retract every forwarded result and the trailing message.
pub async fn hide_results(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
) -> Result<(), HandlerError> {
    let Some(mut record) = deps.conversations.get(user_id) else {
        return Ok(());
    };
    cleanup::retract_all(bot, chat_id, &mut record.ui.results).await;
    cleanup::retract(bot, chat_id, &mut record.ui.end_list).await;
    deps.conversations.clear(user_id);
    Ok(())
}
