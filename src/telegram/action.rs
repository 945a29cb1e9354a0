//! Callback-button payloads.
//!
//! Every inline button carries one `CallbackAction`, serialized to a short
//! colon-delimited string at the boundary. Dispatch matches on the parsed
//! variant only; a payload that fails to parse is dropped, never crashes the
//! handler. Telegram caps payloads at 64 bytes, so tags stay terse.

use crate::categories::Category;
use crate::conversation::Field;
use crate::storage::db::ItemKind;

/// A help screen section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Found,
    Lost,
    Notifications,
    Commands,
}

impl HelpTopic {
    fn tag(self) -> &'static str {
        match self {
            HelpTopic::Found => "found",
            HelpTopic::Lost => "lost",
            HelpTopic::Notifications => "notifications",
            HelpTopic::Commands => "commands",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "found" => Some(HelpTopic::Found),
            "lost" => Some(HelpTopic::Lost),
            "notifications" => Some(HelpTopic::Notifications),
            "commands" => Some(HelpTopic::Commands),
            _ => None,
        }
    }
}

/// Every button press the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Decorative button (calendar padding cells). Answered, otherwise ignored.
    Ignore,
    Help(HelpTopic),

    // Report forms
    PickCategory(Category),
    SkipPhoto,
    Edit(Field),
    Confirm,

    // /lost entry menu
    LostReport,
    LostSearch,

    // Search flow
    FilterCategory(Category),
    HideResults,

    // Subscriptions
    NotifySubscribe,
    NotifyUnsubscribe,
    SubscribeCategory(Category),
    Unsubscribe(Category),
    UnsubscribeDone,
    DismissNotification { message_id: i32 },

    // Moderation (admin only)
    Claim { kind: ItemKind, message_id: i64 },
    Unclaim { kind: ItemKind, message_id: i64, category: Category },
    AdminDelete { kind: ItemKind, message_id: i64 },
    AdminCleanup,
    AdminPage { kind: ItemKind, page: usize },

    // Calendar
    CalendarNav { month_offset: i32 },
    CalendarDay { date: chrono::NaiveDate },
}

impl CallbackAction {
    /// Serialize for `callback_data`.
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Ignore => "ignore".to_string(),
            CallbackAction::Help(topic) => format!("help:{}", topic.tag()),

            CallbackAction::PickCategory(c) => format!("form:cat:{}", c.slug()),
            CallbackAction::SkipPhoto => "form:skip".to_string(),
            CallbackAction::Edit(field) => format!("form:edit:{}", field.tag()),
            CallbackAction::Confirm => "form:confirm".to_string(),

            CallbackAction::LostReport => "lost:report".to_string(),
            CallbackAction::LostSearch => "lost:search".to_string(),

            CallbackAction::FilterCategory(c) => format!("search:cat:{}", c.slug()),
            CallbackAction::HideResults => "search:hide".to_string(),

            CallbackAction::NotifySubscribe => "notify:subscribe".to_string(),
            CallbackAction::NotifyUnsubscribe => "notify:unsubscribe".to_string(),
            CallbackAction::SubscribeCategory(c) => format!("notify:sub:{}", c.slug()),
            CallbackAction::Unsubscribe(c) => format!("notify:unsub:{}", c.slug()),
            CallbackAction::UnsubscribeDone => "notify:done".to_string(),
            CallbackAction::DismissNotification { message_id } => {
                format!("notif:dismiss:{}", message_id)
            }

            CallbackAction::Claim { kind, message_id } => {
                format!("claim:{}:{}", kind.tag(), message_id)
            }
            CallbackAction::Unclaim { kind, message_id, category } => {
                format!("unclaim:{}:{}:{}", kind.tag(), message_id, category.slug())
            }
            CallbackAction::AdminDelete { kind, message_id } => {
                format!("admin:delete:{}:{}", kind.tag(), message_id)
            }
            CallbackAction::AdminCleanup => "admin:cleanup".to_string(),
            CallbackAction::AdminPage { kind, page } => {
                format!("admin:page:{}:{}", kind.tag(), page)
            }

            CallbackAction::CalendarNav { month_offset } => format!("cal:nav:{}", month_offset),
            CallbackAction::CalendarDay { date } => format!("cal:day:{}", date),
        }
    }

    /// Parse a raw payload. Unknown or malformed payloads come back `None`.
    pub fn parse(payload: &str) -> Option<CallbackAction> {
        let parts: Vec<&str> = payload.split(':').collect();
        match parts.as_slice() {
            ["ignore"] => Some(CallbackAction::Ignore),
            ["help", topic] => HelpTopic::from_tag(topic).map(CallbackAction::Help),

            ["form", "cat", slug] => Category::from_slug(slug).map(CallbackAction::PickCategory),
            ["form", "skip"] => Some(CallbackAction::SkipPhoto),
            ["form", "edit", tag] => Field::from_tag(tag).map(CallbackAction::Edit),
            ["form", "confirm"] => Some(CallbackAction::Confirm),

            ["lost", "report"] => Some(CallbackAction::LostReport),
            ["lost", "search"] => Some(CallbackAction::LostSearch),

            ["search", "cat", slug] => {
                Category::from_slug(slug).map(CallbackAction::FilterCategory)
            }
            ["search", "hide"] => Some(CallbackAction::HideResults),

            ["notify", "subscribe"] => Some(CallbackAction::NotifySubscribe),
            ["notify", "unsubscribe"] => Some(CallbackAction::NotifyUnsubscribe),
            ["notify", "sub", slug] => {
                Category::from_slug(slug).map(CallbackAction::SubscribeCategory)
            }
            ["notify", "unsub", slug] => Category::from_slug(slug).map(CallbackAction::Unsubscribe),
            ["notify", "done"] => Some(CallbackAction::UnsubscribeDone),
            ["notif", "dismiss", id] => id
                .parse()
                .ok()
                .map(|message_id| CallbackAction::DismissNotification { message_id }),

            ["claim", kind, id] => Some(CallbackAction::Claim {
                kind: ItemKind::from_tag(kind)?,
                message_id: id.parse().ok()?,
            }),
            ["unclaim", kind, id, slug] => Some(CallbackAction::Unclaim {
                kind: ItemKind::from_tag(kind)?,
                message_id: id.parse().ok()?,
                category: Category::from_slug(slug)?,
            }),
            ["admin", "delete", kind, id] => Some(CallbackAction::AdminDelete {
                kind: ItemKind::from_tag(kind)?,
                message_id: id.parse().ok()?,
            }),
            ["admin", "cleanup"] => Some(CallbackAction::AdminCleanup),
            ["admin", "page", kind, page] => Some(CallbackAction::AdminPage {
                kind: ItemKind::from_tag(kind)?,
                page: page.parse().ok()?,
            }),

            ["cal", "nav", offset] => offset
                .parse()
                .ok()
                .map(|month_offset| CallbackAction::CalendarNav { month_offset }),
            ["cal", "day", date] => date
                .parse()
                .ok()
                .map(|date| CallbackAction::CalendarDay { date }),

            _ => None,
        }
    }
}
