//! Claim/unclaim overlay on feed posts.
//!
//! Claiming removes the record from search results and stamps the post with a
//! banner; unclaiming reverses both. The operations are idempotent at the
//! store level, so a double-tap on either button settles into the same state.

use crate::categories::Category;
use crate::core::error::AppResult;
use crate::gateway::{ChatRef, MessageGateway};
use crate::storage::db::{self, DbPool, ItemKind};
use crate::telegram::keyboards;

/// Prefix stamped onto a claimed post's caption.
pub const CLAIMED_BANNER: &str = "✅ ITEM HAS BEEN CLAIMED ✅\n\n";

/// Default age threshold for the admin cleanup action, in days.
pub const STALE_AFTER_DAYS: i64 = 30;

/// Mark a feed post as claimed.
///
/// Removes the backing record, stamps the caption, and swaps the button for
/// an undo carrying the category (so unclaim can reinsert without re-reading
/// anything). `pressed_caption` is the caption of the message the admin
/// pressed; the stored record's caption takes precedence, because the claim
/// button also sits under /showall control lines that carry no caption at
/// all.
pub async fn claim(
    gateway: &dyn MessageGateway,
    pool: &DbPool,
    channel: &str,
    kind: ItemKind,
    message_id: i64,
    pressed_caption: &str,
) -> AppResult<()> {
    let conn = db::get_connection(pool)?;
    // Record is read before the delete so the undo button can carry the
    // category and the banner lands on the original caption.
    let stored = db::get_item(&conn, kind, message_id)?;
    let category = stored
        .as_ref()
        .and_then(|item| Category::from_slug(&item.category))
        .unwrap_or(Category::Other);
    let caption = match &stored {
        Some(item) if !item.caption.is_empty() => item.caption.clone(),
        _ => pressed_caption.to_string(),
    };

    if stored.is_none() {
        log::info!("Claim on {} post {} had no backing record", kind.tag(), message_id);
        // Without a record or a caption there is nothing safe to stamp.
        if caption.is_empty() {
            return Ok(());
        }
    } else {
        db::delete_item(&conn, kind, message_id)?;
    }
    drop(conn);

    let stamped = if caption.starts_with(CLAIMED_BANNER) {
        caption
    } else {
        format!("{}{}", CLAIMED_BANNER, caption)
    };

    gateway
        .edit_caption(
            &ChatRef::Channel(channel.to_string()),
            message_id as i32,
            &stamped,
            Some(keyboards::unclaim(kind, message_id, category)),
        )
        .await?;
    Ok(())
}

/// Reverse a claim: reinsert the record and strip the banner.
///
/// The reinserted record gets the current date, not the original one; a claim
/// held for a while effectively refreshes the item.
pub async fn unclaim(
    gateway: &dyn MessageGateway,
    pool: &DbPool,
    channel: &str,
    kind: ItemKind,
    message_id: i64,
    category: Category,
    caption: &str,
) -> AppResult<()> {
    let restored = caption.strip_prefix(CLAIMED_BANNER).unwrap_or(caption);

    let conn = db::get_connection(pool)?;
    if db::get_item(&conn, kind, message_id)?.is_none() {
        db::add_item(&conn, kind, category.slug(), message_id, restored)?;
    }
    drop(conn);

    gateway
        .edit_caption(
            &ChatRef::Channel(channel.to_string()),
            message_id as i32,
            restored,
            Some(keyboards::claim(kind, message_id)),
        )
        .await?;
    Ok(())
}

/// Remove an item entirely: the record and, best-effort, the feed post.
/// Returns whether a record was actually removed.
pub async fn delete_post(
    gateway: &dyn MessageGateway,
    pool: &DbPool,
    channel: &str,
    kind: ItemKind,
    message_id: i64,
) -> AppResult<bool> {
    let conn = db::get_connection(pool)?;
    let removed = db::delete_item(&conn, kind, message_id)?;
    drop(conn);

    if let Err(e) = gateway
        .delete_message(&ChatRef::Channel(channel.to_string()), message_id as i32)
        .await
    {
        log::warn!("Could not delete feed post {}: {}", message_id, e);
    }
    Ok(removed)
}

/// Drop records older than [`STALE_AFTER_DAYS`] from both item tables.
/// Returns the total number of rows removed.
pub fn cleanup_stale(pool: &DbPool) -> AppResult<usize> {
    let conn = db::get_connection(pool)?;
    let found = db::delete_items_older_than(&conn, ItemKind::Found, STALE_AFTER_DAYS)?;
    let lost = db::delete_items_older_than(&conn, ItemKind::Lost, STALE_AFTER_DAYS)?;
    log::info!("Cleanup removed {} found and {} lost records", found, lost);
    Ok(found + lost)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn stored_categories(pool: &DbPool, kind: ItemKind) -> Vec<String> {
        let conn = db::get_connection(pool).unwrap();
        db::get_all_items(&conn, kind)
            .unwrap()
            .into_iter()
            .map(|i| i.category)
            .collect()
    }

    #[tokio::test]
    async fn claim_then_unclaim_leaves_one_matching_record() {
        let (_dir, pool) = test_pool();
        let gateway = MockGateway::new();
        {
            let conn = db::get_connection(&pool).unwrap();
            db::add_item(&conn, ItemKind::Found, "bags", 42, "Location: Gym").unwrap();
        }

        claim(&gateway, &pool, CHANNEL, ItemKind::Found, 42, "Location: Gym")
            .await
            .unwrap();
        assert!(stored_categories(&pool, ItemKind::Found).is_empty());

        unclaim(
            &gateway,
            &pool,
            CHANNEL,
            ItemKind::Found,
            42,
            Category::Bags,
            &format!("{}Location: Gym", CLAIMED_BANNER),
        )
        .await
        .unwrap();
        assert_eq!(stored_categories(&pool, ItemKind::Found), vec!["bags".to_string()]);

        // Banner added on claim, stripped on unclaim
        let captions: Vec<String> = gateway
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::EditCaption { caption, .. } => Some(caption),
                _ => None,
            })
            .collect();
        assert_eq!(captions.len(), 2);
        assert!(captions[0].starts_with(CLAIMED_BANNER));
        assert_eq!(captions[1], "Location: Gym");
    }

    #[tokio::test]
    async fn claim_from_listing_keeps_feed_caption() {
        let (_dir, pool) = test_pool();
        let gateway = MockGateway::new();
        {
            let conn = db::get_connection(&pool).unwrap();
            db::add_item(&conn, ItemKind::Found, "bags", 42, "Location: Gym\nDate: 2026-08-01")
                .unwrap();
        }

        // The /showall control line is a plain text message, so the pressed
        // caption is empty; the stored caption must win.
        claim(&gateway, &pool, CHANNEL, ItemKind::Found, 42, "").await.unwrap();
        let stamped = format!("{}Location: Gym\nDate: 2026-08-01", CLAIMED_BANNER);
        assert!(matches!(
            &gateway.calls()[0],
            GatewayCall::EditCaption { caption, .. } if caption == &stamped
        ));

        // Undoing from the channel post round-trips record and caption
        unclaim(&gateway, &pool, CHANNEL, ItemKind::Found, 42, Category::Bags, &stamped)
            .await
            .unwrap();
        let conn = db::get_connection(&pool).unwrap();
        let item = db::get_item(&conn, ItemKind::Found, 42).unwrap().unwrap();
        assert_eq!(item.caption, "Location: Gym\nDate: 2026-08-01");
    }

    #[tokio::test]
    async fn double_claim_is_idempotent() {
        let (_dir, pool) = test_pool();
        let gateway = MockGateway::new();
        {
            let conn = db::get_connection(&pool).unwrap();
            db::add_item(&conn, ItemKind::Found, "hats", 7, "c").unwrap();
        }

        claim(&gateway, &pool, CHANNEL, ItemKind::Found, 7, "c").await.unwrap();
        // Second press sees the already-stamped caption and no record
        claim(
            &gateway,
            &pool,
            CHANNEL,
            ItemKind::Found,
            7,
            &format!("{}c", CLAIMED_BANNER),
        )
        .await
        .unwrap();

        assert!(stored_categories(&pool, ItemKind::Found).is_empty());
        if let GatewayCall::EditCaption { caption, .. } = &gateway.calls()[1] {
            // Banner is not stacked
            assert_eq!(caption, &format!("{}c", CLAIMED_BANNER));
        } else {
            panic!("expected caption edit");
        }
    }

    #[tokio::test]
    async fn double_unclaim_does_not_duplicate_the_record() {
        let (_dir, pool) = test_pool();
        let gateway = MockGateway::new();

        for _ in 0..2 {
            unclaim(&gateway, &pool, CHANNEL, ItemKind::Lost, 5, Category::Shoes, "c")
                .await
                .unwrap();
        }
        assert_eq!(stored_categories(&pool, ItemKind::Lost), vec!["shoes".to_string()]);
    }

    #[tokio::test]
    async fn delete_post_removes_record_and_message() {
        let (_dir, pool) = test_pool();
        let gateway = MockGateway::new();
        {
            let conn = db::get_connection(&pool).unwrap();
            db::add_item(&conn, ItemKind::Found, "bags", 11, "").unwrap();
        }

        assert!(delete_post(&gateway, &pool, CHANNEL, ItemKind::Found, 11).await.unwrap());
        assert!(stored_categories(&pool, ItemKind::Found).is_empty());
        assert!(matches!(
            gateway.calls()[0],
            GatewayCall::Delete { message_id: 11, .. }
        ));

        // Absent record: no-op on the store, still reported
        assert!(!delete_post(&gateway, &pool, CHANNEL, ItemKind::Found, 11).await.unwrap());
    }
}
