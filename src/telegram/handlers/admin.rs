//! Admin surface: the /showall listing, claim/unclaim and delete buttons,
//! stale-record cleanup, and the /sendall broadcast.

use teloxide::prelude::*;
use teloxide::types::{MessageId, Recipient};

use crate::broadcast::{self, BroadcastContent};
use crate::categories::Category;
use crate::core::config;
use crate::conversation::{ConversationData, ConversationState};
use crate::moderation;
use crate::render;
use crate::storage::db::{self, ItemKind};
use crate::telegram::handlers::{HandlerDeps, HandlerError};
use crate::telegram::{cleanup, keyboards};

/// Items per /showall page.
const PAGE_SIZE: usize = 5;

async fn admin_notice(bot: &Bot, chat_id: ChatId, text: &str) -> Result<(), HandlerError> {
    let sent = bot.send_message(chat_id, text).await?;
    cleanup::delete_after_delay(
        bot.clone(),
        chat_id,
        sent.id.0,
        config::cleanup::admin_notice_delay(),
    );
    Ok(())
}

/// Render one page of the stored-items listing: each record's feed post
/// forwarded back, a control line with claim/delete under it, and a pager.
pub async fn show_page(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    kind: ItemKind,
    page: usize,
) -> Result<(), HandlerError> {
    // Take down the previous page before rendering the next one.
    if let Some(mut old) = deps.conversations.get(user_id) {
        cleanup::retract_all(bot, chat_id, &mut old.ui.results).await;
        cleanup::retract(bot, chat_id, &mut old.ui.end_list).await;
    }

    let items = {
        let conn = db::get_connection(&deps.db_pool)?;
        db::get_all_items(&conn, kind)?
    };
    if items.is_empty() {
        deps.conversations.clear(user_id);
        return admin_notice(bot, chat_id, "No records stored.").await;
    }

    let pages = items.len().div_ceil(PAGE_SIZE);
    let page = page.min(pages - 1);

    let mut record = deps.conversations.start(
        user_id,
        ConversationState::ViewingResults,
        ConversationData::None,
    );

    let feed = Recipient::ChannelUsername(config::CHANNEL_USERNAME.clone());
    for item in items.iter().skip(page * PAGE_SIZE).take(PAGE_SIZE) {
        match bot
            .forward_message(chat_id, feed.clone(), MessageId(item.message_id as i32))
            .await
        {
            Ok(fwd) => record.ui.results.push(fwd.id.0),
            Err(e) => log::warn!("Could not forward feed post {}: {}", item.message_id, e),
        }

        let label = Category::from_slug_or_other(&item.category).label();
        let mut text = format!("#{} · {} · {}", item.message_id, label, item.date);
        if let Some(details) = render::caption_details(&item.caption) {
            text.push('\n');
            text.push_str(&details);
        }
        let line = bot
            .send_message(chat_id, text)
            .reply_markup(keyboards::admin_item(kind, item.message_id))
            .await?;
        record.ui.results.push(line.id.0);
    }

    let pager = bot
        .send_message(chat_id, format!("Page {}/{} · {} records", page + 1, pages, items.len()))
        .reply_markup(keyboards::admin_pager(kind, page, page > 0, page + 1 < pages))
        .await?;
    record.ui.end_list = Some(pager.id.0);

    deps.conversations.put(user_id, record);
    Ok(())
}

/// The claim button on a feed post or /showall control line.
pub async fn claim(
    bot: &Bot,
    deps: &HandlerDeps,
    user_id: i64,
    kind: ItemKind,
    message_id: i64,
    caption: &str,
) -> Result<(), HandlerError> {
    if !config::is_admin(user_id) {
        log::info!("User {} tried to claim {} post {}", user_id, kind.tag(), message_id);
        return Ok(());
    }
    if let Err(e) = moderation::claim(
        deps.gateway.as_ref(),
        &deps.db_pool,
        &config::CHANNEL_USERNAME,
        kind,
        message_id,
        caption,
    )
    .await
    {
        log::error!("Claim of {} post {} failed: {}", kind.tag(), message_id, e);
        // The button lives in the channel; report to the admin directly.
        admin_notice(bot, ChatId(user_id), "⚠️ Claim failed, see the log.").await?;
    }
    Ok(())
}

/// The undo button on a claimed post.
pub async fn unclaim(
    bot: &Bot,
    deps: &HandlerDeps,
    user_id: i64,
    kind: ItemKind,
    message_id: i64,
    category: Category,
    caption: &str,
) -> Result<(), HandlerError> {
    if !config::is_admin(user_id) {
        return Ok(());
    }
    if let Err(e) = moderation::unclaim(
        deps.gateway.as_ref(),
        &deps.db_pool,
        &config::CHANNEL_USERNAME,
        kind,
        message_id,
        category,
        caption,
    )
    .await
    {
        log::error!("Unclaim of {} post {} failed: {}", kind.tag(), message_id, e);
        admin_notice(bot, ChatId(user_id), "⚠️ Unclaim failed, see the log.").await?;
    }
    Ok(())
}

/// The delete button in the /showall listing.
pub async fn delete_item(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    kind: ItemKind,
    message_id: i64,
) -> Result<(), HandlerError> {
    if !config::is_admin(user_id) {
        return Ok(());
    }
    let removed = moderation::delete_post(
        deps.gateway.as_ref(),
        &deps.db_pool,
        &config::CHANNEL_USERNAME,
        kind,
        message_id,
    )
    .await?;
    let text = if removed {
        "🗑 Record and feed post removed."
    } else {
        "🗑 Record was already gone; feed post removed."
    };
    admin_notice(bot, chat_id, text).await
}

/// The cleanup button: drop records older than the stale threshold.
pub async fn cleanup(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
) -> Result<(), HandlerError> {
    if !config::is_admin(user_id) {
        return Ok(());
    }
    let removed = moderation::cleanup_stale(&deps.db_pool)?;
    admin_notice(bot, chat_id, &format!("🧹 Removed {} stale record(s).", removed)).await
}

/// The message an admin sends after /sendall.
pub async fn handle_broadcast_message(
    bot: &Bot,
    deps: &HandlerDeps,
    msg: &Message,
    user_id: i64,
) -> Result<(), HandlerError> {
    if !config::is_admin(user_id) {
        deps.conversations.clear(user_id);
        return Ok(());
    }
    let chat_id = msg.chat.id;

    let photo_id = msg
        .photo()
        .and_then(|sizes| sizes.iter().max_by_key(|p| p.width * p.height))
        .map(|p| p.file.id.0.clone());
    let content = match (photo_id, msg.text()) {
        (Some(file_id), _) => BroadcastContent::Photo {
            file_id,
            caption: msg.caption().map(str::to_string),
        },
        (None, Some(text)) => BroadcastContent::Text(text.to_string()),
        (None, None) => {
            bot.send_message(chat_id, "Send plain text or a photo to broadcast.")
                .await?;
            return Ok(());
        }
    };

    deps.conversations.clear(user_id);
    let report = broadcast::broadcast(deps.gateway.as_ref(), &deps.db_pool, &content).await?;
    bot.send_message(
        chat_id,
        format!("📬 Delivered to {} user(s), {} failed.", report.delivered, report.failed),
    )
    .await?;
    Ok(())
}
