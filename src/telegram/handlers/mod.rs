//! Telegram bot handler tree configuration
//!
//! The dispatcher schema lives here so integration tests can run the same
//! handler tree as production code. Three branches: commands, plain messages
//! (routed by the sender's conversation state), and callback buttons (routed
//! by parsed [`CallbackAction`]).

pub mod admin;
pub mod commands;
pub mod form;
pub mod search;
pub mod subscriptions;

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use crate::conversation::{ConversationState, ConversationStore};
use crate::core::config;
use crate::gateway::MessageGateway;
use crate::storage::db::DbPool;
use crate::telegram::action::CallbackAction;
use crate::telegram::bot::Command;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub conversations: Arc<ConversationStore>,
    pub gateway: Arc<dyn MessageGateway>,
}

impl HandlerDeps {
    pub fn new(
        db_pool: Arc<DbPool>,
        conversations: Arc<ConversationStore>,
        gateway: Arc<dyn MessageGateway>,
    ) -> Self {
        Self { db_pool, conversations, gateway }
    }
}

/// Sender of a message, when it carries one.
fn sender(msg: &Message) -> Option<i64> {
    msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok())
}

/// Slash-prefixed text is a command attempt, even when it matches no known
/// command. It must never be taken as form input or broadcast content.
fn is_command_text(text: Option<&str>) -> bool {
    text.is_some_and(|t| t.starts_with('/'))
}

/// Create the dispatcher handler tree.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(
        dptree::entry()
            .filter_command::<Command>()
            .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                let deps = deps.clone();
                async move { commands::handle_command(&bot, &deps, &msg, cmd).await }
            }),
    )
}

/// Plain messages (free text, photos). Only meaningful mid-conversation;
/// anything from a user with no active record is dropped.
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let deps = deps.clone();
        async move {
            if is_command_text(msg.text()) {
                return Ok(());
            }
            let Some(user_id) = sender(&msg) else {
                return Ok(());
            };
            let Some(record) = deps.conversations.get(user_id) else {
                return Ok(());
            };

            match record.state {
                ConversationState::AwaitPhoto
                | ConversationState::AwaitCategory
                | ConversationState::Summary
                | ConversationState::Editing(_) => {
                    form::handle_form_message(&bot, &deps, &msg, user_id, record).await
                }
                ConversationState::AwaitFilterDays => {
                    search::handle_days_message(&bot, &deps, &msg, user_id, record).await
                }
                ConversationState::AwaitBroadcast => {
                    admin::handle_broadcast_message(&bot, &deps, &msg, user_id).await
                }
                _ => Ok(()),
            }
        }
    })
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move { handle_callback(&bot, &deps, q).await }
    })
}

async fn handle_callback(bot: &Bot, deps: &HandlerDeps, q: CallbackQuery) -> Result<(), HandlerError> {
    // Stop the button spinner regardless of what happens next.
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        log::warn!("Dropping unparseable callback payload: {:?}", q.data);
        return Ok(());
    };

    let Ok(user_id) = i64::try_from(q.from.id.0) else {
        return Ok(());
    };
    // Where the pressed button lives; falls back to the user's own chat.
    let chat_id = q.message.as_ref().map(|m| m.chat().id).unwrap_or(ChatId(user_id));
    let message_id = q.message.as_ref().map(|m| m.id().0);
    let caption = q
        .message
        .as_ref()
        .and_then(|m| match m {
            teloxide::types::MaybeInaccessibleMessage::Regular(msg) => msg.caption(),
            teloxide::types::MaybeInaccessibleMessage::Inaccessible(_) => None,
        })
        .unwrap_or_default()
        .to_string();

    match action {
        CallbackAction::Ignore => Ok(()),
        CallbackAction::Help(topic) => commands::show_help_topic(bot, chat_id, message_id, topic).await,

        CallbackAction::PickCategory(_)
        | CallbackAction::SkipPhoto
        | CallbackAction::Edit(_)
        | CallbackAction::Confirm => {
            form::handle_form_action(bot, deps, chat_id, user_id, &action).await
        }

        CallbackAction::LostReport => form::start_lost_report(bot, deps, chat_id, user_id, message_id).await,
        CallbackAction::LostSearch => search::start_filter(bot, deps, chat_id, user_id, message_id).await,
        CallbackAction::FilterCategory(category) => {
            search::pick_category(bot, deps, chat_id, user_id, category).await
        }
        CallbackAction::HideResults => search::hide_results(bot, deps, chat_id, user_id).await,

        CallbackAction::NotifySubscribe => {
            subscriptions::show_subscribe_grid(bot, chat_id, message_id).await
        }
        CallbackAction::NotifyUnsubscribe => {
            subscriptions::show_unsubscribe_list(bot, deps, chat_id, user_id, message_id).await
        }
        CallbackAction::SubscribeCategory(category) => {
            subscriptions::subscribe(bot, deps, chat_id, user_id, message_id, category).await
        }
        CallbackAction::Unsubscribe(category) => {
            subscriptions::unsubscribe(bot, deps, chat_id, user_id, message_id, category).await
        }
        CallbackAction::UnsubscribeDone => {
            subscriptions::finish_unsubscribe(bot, chat_id, message_id).await
        }
        CallbackAction::DismissNotification { message_id } => {
            subscriptions::dismiss_notification(bot, chat_id, message_id).await
        }

        CallbackAction::Claim { kind, message_id } => {
            admin::claim(bot, deps, user_id, kind, message_id, &caption).await
        }
        CallbackAction::Unclaim { kind, message_id, category } => {
            admin::unclaim(bot, deps, user_id, kind, message_id, category, &caption).await
        }
        CallbackAction::AdminDelete { kind, message_id } => {
            admin::delete_item(bot, deps, chat_id, user_id, kind, message_id).await
        }
        CallbackAction::AdminCleanup => admin::cleanup(bot, deps, chat_id, user_id).await,
        CallbackAction::AdminPage { kind, page } => {
            if !config::is_admin(user_id) {
                return Ok(());
            }
            admin::show_page(bot, deps, chat_id, user_id, kind, page).await
        }

        CallbackAction::CalendarNav { month_offset } => {
            commands::navigate_calendar(bot, chat_id, message_id, month_offset).await
        }
        CallbackAction::CalendarDay { date } => {
            search::show_items_on_date(bot, deps, chat_id, user_id, date).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_commands_are_not_form_input() {
        assert!(is_command_text(Some("/typo")));
        assert!(is_command_text(Some("/sendall extra")));
        assert!(!is_command_text(Some("left it at /the gym")));
        assert!(!is_command_text(Some("blue backpack")));
        assert!(!is_command_text(None));
    }
}
