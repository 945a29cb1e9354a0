//! Inline keyboard construction.
//!
//! All buttons carry `CallbackAction` payloads; nothing here encodes a raw
//! string by hand.

use itertools::Itertools;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::categories::Category;
use crate::render::Summary;
use crate::storage::db::ItemKind;
use crate::telegram::action::{CallbackAction, HelpTopic};
use strum::IntoEnumIterator;

fn button(label: &str, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.encode())
}

/// Category picker, two buttons per row.
fn category_grid(to_action: impl Fn(Category) -> CallbackAction) -> InlineKeyboardMarkup {
    let buttons = Category::iter().map(|c| button(c.label(), to_action(c)));
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for chunk in &buttons.chunks(2) {
        rows.push(chunk.collect());
    }
    InlineKeyboardMarkup::new(rows)
}

/// Category picker for a report form.
pub fn form_categories() -> InlineKeyboardMarkup {
    category_grid(CallbackAction::PickCategory)
}

/// Category picker for the search filter.
pub fn filter_categories() -> InlineKeyboardMarkup {
    category_grid(CallbackAction::FilterCategory)
}

/// Category picker for subscribing to notifications.
pub fn subscribe_categories() -> InlineKeyboardMarkup {
    category_grid(CallbackAction::SubscribeCategory)
}

/// Skip button shown under the optional photo prompt.
pub fn skip_photo() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("⏭ Skip Photo", CallbackAction::SkipPhoto)]])
}

/// Edit-field buttons plus the confirm row, from a rendered summary.
pub fn summary_actions(summary: &Summary) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = summary
        .actions
        .iter()
        .map(|a| vec![button(a.label, CallbackAction::Edit(a.field))])
        .collect();
    rows.push(vec![button("✅ Confirm and Submit", CallbackAction::Confirm)]);
    InlineKeyboardMarkup::new(rows)
}

/// The /lost entry menu: search the feed or file a report.
pub fn lost_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("🔎 Search found items", CallbackAction::LostSearch)],
        vec![button("📋 Report a lost item", CallbackAction::LostReport)],
    ])
}

/// The /notification entry menu.
pub fn notify_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("🔔 Subscribe", CallbackAction::NotifySubscribe)],
        vec![button("🔕 Unsubscribe", CallbackAction::NotifyUnsubscribe)],
    ])
}

/// One unsubscribe button per active subscription, plus a done row.
pub fn unsubscribe_list(subscribed: &[Category]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = subscribed
        .iter()
        .map(|&c| vec![button(c.label(), CallbackAction::Unsubscribe(c))])
        .collect();
    rows.push(vec![button("✔️ Done", CallbackAction::UnsubscribeDone)]);
    InlineKeyboardMarkup::new(rows)
}

/// Hide button posted after a batch of search results.
pub fn hide_results() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🙈 Hide results", CallbackAction::HideResults)]])
}

/// Dismiss button under a subscriber notification.
pub fn dismiss_notification(message_id: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "🗑 Delete",
        CallbackAction::DismissNotification { message_id },
    )]])
}

/// Claim button attached to a feed post.
pub fn claim(kind: ItemKind, message_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "✅ Claimed",
        CallbackAction::Claim { kind, message_id },
    )]])
}

/// Undo button attached to a claimed feed post. Carries the category so the
/// record can be reinserted without re-reading the caption.
pub fn unclaim(kind: ItemKind, message_id: i64, category: Category) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "↩️ Undo claim",
        CallbackAction::Unclaim { kind, message_id, category },
    )]])
}

/// Per-item admin controls in the /showall listing.
pub fn admin_item(kind: ItemKind, message_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button("✅ Claimed", CallbackAction::Claim { kind, message_id }),
        button("🗑 Delete", CallbackAction::AdminDelete { kind, message_id }),
    ]])
}

/// Page navigation for the /showall listing.
pub fn admin_pager(kind: ItemKind, page: usize, has_prev: bool, has_next: bool) -> InlineKeyboardMarkup {
    let mut row = Vec::new();
    if has_prev {
        row.push(button("⬅️ Prev", CallbackAction::AdminPage { kind, page: page - 1 }));
    }
    if has_next {
        row.push(button("➡️ Next", CallbackAction::AdminPage { kind, page: page + 1 }));
    }
    let mut rows = vec![row];
    rows.push(vec![button("🧹 Clean up stale records", CallbackAction::AdminCleanup)]);
    InlineKeyboardMarkup::new(rows)
}

/// Help section buttons under /help.
pub fn help_sections() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("📦 Found an item", CallbackAction::Help(HelpTopic::Found))],
        vec![button("🔎 Lost an item", CallbackAction::Help(HelpTopic::Lost))],
        vec![button("🔔 Notifications", CallbackAction::Help(HelpTopic::Notifications))],
        vec![button("📋 All commands", CallbackAction::Help(HelpTopic::Commands))],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payloads(kb: &InlineKeyboardMarkup) -> Vec<String> {
        kb.inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn category_grid_covers_every_category_and_parses_back() {
        let kb = form_categories();
        let payloads = payloads(&kb);
        assert_eq!(payloads.len(), Category::iter().count());
        for p in &payloads {
            assert!(matches!(
                CallbackAction::parse(p),
                Some(CallbackAction::PickCategory(_))
            ));
        }
        // Two per row, odd count leaves a short last row
        assert!(kb.inline_keyboard.iter().all(|row| row.len() <= 2));
    }

    #[test]
    fn summary_keyboard_ends_with_confirm() {
        let fields = crate::conversation::FlowFields::new(crate::conversation::FlowKind::FoundReport);
        let kb = summary_actions(&crate::render::render(&fields));
        let payloads = payloads(&kb);
        assert_eq!(payloads.last().unwrap(), "form:confirm");
        // One edit button per editable field
        assert_eq!(payloads.len(), fields.editable_fields().len() + 1);
    }

    #[test]
    fn unclaim_keyboard_carries_category() {
        let kb = unclaim(ItemKind::Found, 42, Category::Bags);
        let payloads = payloads(&kb);
        assert_eq!(payloads, vec!["unclaim:found:42:bags".to_string()]);
    }
}
