//! Submission pipeline: confirmed form → feed post → record → notifications.
//!
//! Only the feed post itself is load-bearing. If it fails, nothing happened
//! and the caller gets an error. Every later step (claim button, record
//! insert, subscriber notifications) degrades independently: a failure is
//! logged and the pipeline keeps going, so one broken subscriber chat can
//! never block a submission.

use thiserror::Error;

use crate::categories::Category;
use crate::conversation::{FlowFields, FlowKind};
use crate::core::error::AppResult;
use crate::gateway::{ChatRef, GatewayError, MessageGateway};
use crate::render;
use crate::storage::db::{self, DbPool, ItemKind};
use crate::telegram::keyboards;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("feed post failed: {0}")]
    FeedPostFailed(#[source] GatewayError),
}

/// What came out of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub kind: ItemKind,
    pub category: Category,
    pub feed_message_id: i64,
    pub notified: usize,
    pub notify_failed: usize,
}

fn item_kind(kind: FlowKind) -> ItemKind {
    match kind {
        FlowKind::FoundReport => ItemKind::Found,
        FlowKind::LostReport => ItemKind::Lost,
    }
}

/// Run the full pipeline for a confirmed form.
///
/// `channel` is the public feed (e.g. `"@lostfound_feed"`). Every subscriber
/// of the category gets one notification, the submitter included.
pub async fn submit(
    gateway: &dyn MessageGateway,
    pool: &DbPool,
    channel: &str,
    fields: &FlowFields,
) -> Result<SubmitReceipt, SubmitError> {
    let kind = item_kind(fields.kind());
    // An unset category can only come from a stale record; file it as Other
    // rather than refusing the submission.
    let category = fields.category().unwrap_or(Category::Other);
    let date = chrono::Utc::now().date_naive();
    let caption = render::feed_caption(fields, date);

    let feed = ChatRef::Channel(channel.to_string());
    let feed_msg = match fields.photo() {
        Some(file_id) => gateway
            .send_photo(&feed, file_id, &caption, None)
            .await
            .map_err(SubmitError::FeedPostFailed)?,
        None => gateway
            .send_text(&feed, &caption, None)
            .await
            .map_err(SubmitError::FeedPostFailed)?,
    };
    let feed_message_id = i64::from(feed_msg);

    // Claim button; the post stands on its own without it.
    if let Err(e) = gateway
        .edit_markup(&feed, feed_msg, keyboards::claim(kind, feed_message_id))
        .await
    {
        log::warn!("Could not attach claim button to feed post {}: {}", feed_message_id, e);
    }

    if let Err(e) = persist(pool, kind, category, feed_message_id, &caption) {
        log::warn!("Could not record feed post {}: {}", feed_message_id, e);
    }

    let (notified, notify_failed) = if kind == ItemKind::Found {
        notify_subscribers(gateway, pool, category, fields, &caption).await
    } else {
        (0, 0)
    };

    log::info!(
        "Submitted {} item in {} as feed post {} ({} notified, {} failed)",
        kind.tag(),
        category.slug(),
        feed_message_id,
        notified,
        notify_failed
    );

    Ok(SubmitReceipt {
        kind,
        category,
        feed_message_id,
        notified,
        notify_failed,
    })
}

fn persist(
    pool: &DbPool,
    kind: ItemKind,
    category: Category,
    message_id: i64,
    caption: &str,
) -> AppResult<()> {
    let conn = db::get_connection(pool)?;
    db::add_item(&conn, kind, category.slug(), message_id, caption)?;
    Ok(())
}

/// Fan a found-item notification out to the category's subscribers.
///
/// Each delivery is independent; a failure is counted and logged, never
/// propagated. Returns (delivered, failed).
async fn notify_subscribers(
    gateway: &dyn MessageGateway,
    pool: &DbPool,
    category: Category,
    fields: &FlowFields,
    feed_caption: &str,
) -> (usize, usize) {
    let subscribers = match subscriber_ids(pool, category) {
        Ok(ids) => ids,
        Err(e) => {
            log::warn!("Could not load subscribers for {}: {}", category.slug(), e);
            return (0, 0);
        }
    };

    let text = render::notification_caption(fields, feed_caption);
    let mut delivered = 0;
    let mut failed = 0;

    for user_id in subscribers {
        let chat = ChatRef::User(user_id);
        let sent = match fields.photo() {
            Some(file_id) => gateway.send_photo(&chat, file_id, &text, None).await,
            None => gateway.send_text(&chat, &text, None).await,
        };
        match sent {
            Ok(message_id) => {
                delivered += 1;
                // Self-referencing dismiss button; the id is only known
                // after the send.
                if let Err(e) = gateway
                    .edit_markup(&chat, message_id, keyboards::dismiss_notification(message_id))
                    .await
                {
                    log::debug!("No dismiss button for notification {}: {}", message_id, e);
                }
            }
            Err(e) => {
                failed += 1;
                log::warn!("Notification to {} failed: {}", user_id, e);
            }
        }
    }

    (delivered, failed)
}

fn subscriber_ids(pool: &DbPool, category: Category) -> AppResult<Vec<i64>> {
    let conn = db::get_connection(pool)?;
    Ok(db::get_subscribers(&conn, category.slug())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Field;
    use crate::gateway::mock::{GatewayCall, MockGateway};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const CHANNEL: &str = "@test_feed";

    fn test_pool() -> (TempDir, DbPool) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        let pool = db::create_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }

    fn found_fields() -> FlowFields {
        let mut fields = FlowFields::new(FlowKind::FoundReport);
        fields.set_photo("photo_file".to_string());
        fields.set_category(Category::Bags);
        fields.set_text(Field::Location, "Gym".to_string());
        fields
    }

    #[tokio::test]
    async fn submit_succeeds_with_zero_subscribers() {
        let (_dir, pool) = test_pool();
        let gateway = MockGateway::new();

        let receipt = submit(&gateway, &pool, CHANNEL, &found_fields())
            .await
            .unwrap();

        assert_eq!(receipt.kind, ItemKind::Found);
        assert_eq!(receipt.category, Category::Bags);
        assert_eq!(receipt.notified, 0);
        assert_eq!(receipt.notify_failed, 0);

        // Feed post, then the claim button
        let calls = gateway.calls();
        assert!(matches!(
            &calls[0],
            GatewayCall::SendPhoto { chat: ChatRef::Channel(c), photo, .. }
                if c == CHANNEL && photo == "photo_file"
        ));
        assert!(matches!(&calls[1], GatewayCall::EditMarkup { .. }));

        // Record persisted against the feed message id, caption included
        let conn = db::get_connection(&pool).unwrap();
        let items = db::get_all_items(&conn, ItemKind::Found).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, "bags");
        assert_eq!(items[0].message_id, receipt.feed_message_id);
        assert!(items[0].caption.starts_with("Location: Gym"));
    }

    #[tokio::test]
    async fn feed_post_failure_aborts_without_side_effects() {
        let (_dir, pool) = test_pool();
        let gateway = MockGateway::new();
        gateway.fail_sends_to(ChatRef::Channel(CHANNEL.to_string()));

        let result = submit(&gateway, &pool, CHANNEL, &found_fields()).await;
        assert!(matches!(result, Err(SubmitError::FeedPostFailed(_))));

        let conn = db::get_connection(&pool).unwrap();
        assert!(db::get_all_items(&conn, ItemKind::Found).unwrap().is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn fanout_counts_failures_and_reaches_every_subscriber() {
        let (_dir, pool) = test_pool();
        {
            let conn = db::get_connection(&pool).unwrap();
            for user in [1, 2, 3, 4] {
                db::subscribe(&conn, user, "bags").unwrap();
            }
        }
        let gateway = MockGateway::new();
        gateway.fail_sends_to(ChatRef::User(3));

        let receipt = submit(&gateway, &pool, CHANNEL, &found_fields())
            .await
            .unwrap();

        assert_eq!(receipt.notified, 3);
        assert_eq!(receipt.notify_failed, 1);

        let mut notified_users: Vec<_> = gateway
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::SendPhoto { chat: ChatRef::User(id), .. } => Some(id),
                _ => None,
            })
            .collect();
        notified_users.sort_unstable();
        assert_eq!(notified_users, vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn lost_report_without_photo_posts_text_and_notifies_nobody() {
        let (_dir, pool) = test_pool();
        {
            let conn = db::get_connection(&pool).unwrap();
            db::subscribe(&conn, 2, "hats").unwrap();
        }
        let gateway = MockGateway::new();

        let mut fields = FlowFields::new(FlowKind::LostReport);
        fields.set_category(Category::Hats);

        let receipt = submit(&gateway, &pool, CHANNEL, &fields).await.unwrap();
        assert_eq!(receipt.kind, ItemKind::Lost);
        assert_eq!(receipt.notified, 0);

        let calls = gateway.calls();
        assert!(matches!(
            &calls[0],
            GatewayCall::SendText { chat: ChatRef::Channel(_), text, .. }
                if text.starts_with("🔎 Lost Item")
        ));
        // Subscriber 2 never contacted for a lost report
        assert!(!calls
            .iter()
            .any(|c| matches!(c, GatewayCall::SendText { chat: ChatRef::User(_), .. })));

        let conn = db::get_connection(&pool).unwrap();
        assert_eq!(db::get_all_items(&conn, ItemKind::Lost).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn claim_button_failure_does_not_fail_submission() {
        let (_dir, pool) = test_pool();
        let gateway = MockGateway::new();
        gateway.fail_edits();

        let receipt = submit(&gateway, &pool, CHANNEL, &found_fields()).await;
        assert!(receipt.is_ok());

        let conn = db::get_connection(&pool).unwrap();
        assert_eq!(db::get_all_items(&conn, ItemKind::Found).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_category_falls_back_to_other() {
        let (_dir, pool) = test_pool();
        let gateway = MockGateway::new();

        let mut fields = FlowFields::new(FlowKind::FoundReport);
        fields.set_photo("p".to_string());

        let receipt = submit(&gateway, &pool, CHANNEL, &fields).await.unwrap();
        assert_eq!(receipt.category, Category::Other);

        let conn = db::get_connection(&pool).unwrap();
        let items = db::get_all_items(&conn, ItemKind::Found).unwrap();
        assert_eq!(items[0].category, "other");
    }
}
