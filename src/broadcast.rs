//! Admin broadcast to every registered user.

use crate::core::error::AppResult;
use crate::gateway::{ChatRef, MessageGateway};
use crate::storage::db::{self, DbPool};

const BROADCAST_BADGE: &str = "👮‍♂️ Broadcast from administrator:";

/// What the admin sent: plain text or a photo with an optional caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastContent {
    Text(String),
    Photo { file_id: String, caption: Option<String> },
}

/// Delivery tally, reported back to the sending admin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Send `content` to every registered user, badge prepended.
///
/// Deliveries are independent; users who blocked the bot just bump the
/// failure count.
pub async fn broadcast(
    gateway: &dyn MessageGateway,
    pool: &DbPool,
    content: &BroadcastContent,
) -> AppResult<BroadcastReport> {
    let user_ids = {
        let conn = db::get_connection(pool)?;
        db::get_all_user_ids(&conn)?
    };

    let mut report = BroadcastReport::default();
    for user_id in user_ids {
        let chat = ChatRef::User(user_id);
        let sent = match content {
            BroadcastContent::Text(text) => {
                let body = format!("{}\n\n{}", BROADCAST_BADGE, text);
                gateway.send_text(&chat, &body, None).await
            }
            BroadcastContent::Photo { file_id, caption } => {
                let body = match caption {
                    Some(caption) => format!("{}\n\n{}", BROADCAST_BADGE, caption),
                    None => BROADCAST_BADGE.to_string(),
                };
                gateway.send_photo(&chat, file_id, &body, None).await
            }
        };
        match sent {
            Ok(_) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                log::warn!("Broadcast to {} failed: {}", user_id, e);
            }
        }
    }

    log::info!(
        "Broadcast finished: {} delivered, {} failed",
        report.delivered,
        report.failed
    );
    Ok(report)
}
