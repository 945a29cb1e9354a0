//! Report-form handlers: classify updates into [`FormInput`], run the state
//! machine, and put its outcome on screen.
//!
//! UI bookkeeping happens here. Each re-render retracts the previous prompt,
//! summary, and button messages (best-effort) so the chat never shows two
//! live keyboards for the same form.

use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, ParseMode};

use crate::conversation::{ConversationData, ConversationRecord, ConversationState, Field, FlowFields, FlowKind};
use crate::core::config;
use crate::flow::{self, FormInput, FormOutcome};
use crate::render;
use crate::submit;
use crate::telegram::action::CallbackAction;
use crate::telegram::handlers::{HandlerDeps, HandlerError};
use crate::telegram::{cleanup, keyboards};

/// Begin a report flow, replacing any prior conversation.
pub async fn start_form(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    kind: FlowKind,
) -> Result<(), HandlerError> {
    let mut record = deps.conversations.start(
        user_id,
        ConversationState::AwaitPhoto,
        ConversationData::Form(FlowFields::new(kind)),
    );

    let step = &flow::steps(kind)[0];
    let mut req = bot.send_message(chat_id, step.prompt);
    if step.skippable {
        req = req.reply_markup(keyboards::skip_photo());
    }
    let sent = req.await?;
    record.ui.last_prompt = Some(sent.id.0);
    deps.conversations.put(user_id, record);
    Ok(())
}

/// The "report a lost item" button on the /lost menu.
pub async fn start_lost_report(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    menu_message_id: Option<i32>,
) -> Result<(), HandlerError> {
    if let Some(id) = menu_message_id {
        cleanup::delete_msg(bot, chat_id, id).await;
    }
    start_form(bot, deps, chat_id, user_id, FlowKind::LostReport).await
}

/// A plain message (photo or text) arriving while a form is active.
pub async fn handle_form_message(
    bot: &Bot,
    deps: &HandlerDeps,
    msg: &Message,
    user_id: i64,
    mut record: ConversationRecord,
) -> Result<(), HandlerError> {
    let photo_id = msg
        .photo()
        .and_then(|sizes| sizes.iter().max_by_key(|p| p.width * p.height))
        .map(|p| p.file.id.0.clone());

    let outcome = match (&photo_id, msg.text()) {
        (Some(file_id), _) => flow::advance(&mut record, FormInput::Photo(file_id)),
        (None, Some(text)) => flow::advance(&mut record, FormInput::Text(text)),
        (None, None) => FormOutcome::Ignored,
    };

    // The form re-renders everything it took; the raw input only clutters
    // the chat once accepted.
    if outcome.consumed_input() {
        cleanup::delete_msg(bot, msg.chat.id, msg.id.0).await;
    }

    apply_outcome(bot, deps, msg.chat.id, user_id, record, outcome).await
}

/// A form-related button press (category pick, skip, edit, confirm).
pub async fn handle_form_action(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    action: &CallbackAction,
) -> Result<(), HandlerError> {
    let Some(mut record) = deps.conversations.get(user_id) else {
        return Ok(());
    };

    let input = match action {
        CallbackAction::PickCategory(category) => FormInput::Category(*category),
        CallbackAction::SkipPhoto => FormInput::SkipPhoto,
        CallbackAction::Edit(field) => FormInput::Edit(*field),
        CallbackAction::Confirm => FormInput::Confirm,
        _ => return Ok(()),
    };

    let outcome = flow::advance(&mut record, input);
    apply_outcome(bot, deps, chat_id, user_id, record, outcome).await
}

/// Put a [`FormOutcome`] on screen and store the updated record.
async fn apply_outcome(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: i64,
    mut record: ConversationRecord,
    outcome: FormOutcome,
) -> Result<(), HandlerError> {
    match outcome {
        FormOutcome::Prompt { field, prompt } => {
            cleanup::retract(bot, chat_id, &mut record.ui.last_prompt).await;

            let kind = record.data.form().map(|f| f.kind());
            let mut req = bot.send_message(chat_id, prompt);
            match field {
                Field::Category => req = req.reply_markup(keyboards::form_categories()),
                Field::Photo if kind == Some(FlowKind::LostReport) => {
                    req = req.reply_markup(keyboards::skip_photo());
                }
                _ => {}
            }
            let sent = req.await?;
            record.ui.last_prompt = Some(sent.id.0);
            deps.conversations.put(user_id, record);
        }

        FormOutcome::ShowSummary => {
            cleanup::retract(bot, chat_id, &mut record.ui.last_prompt).await;
            cleanup::retract(bot, chat_id, &mut record.ui.summary).await;
            cleanup::retract(bot, chat_id, &mut record.ui.buttons).await;

            let Some(fields) = record.data.form() else {
                return Ok(());
            };
            let summary = render::render(fields);

            let summary_id = match fields.photo() {
                Some(file_id) => {
                    bot.send_photo(chat_id, InputFile::file_id(FileId(file_id.to_string())))
                        .caption(summary.text.clone())
                        .parse_mode(ParseMode::Html)
                        .await?
                        .id
                        .0
                }
                None => {
                    bot.send_message(chat_id, summary.text.clone())
                        .parse_mode(ParseMode::Html)
                        .await?
                        .id
                        .0
                }
            };
            let buttons = bot
                .send_message(chat_id, render::confirm_question())
                .reply_markup(keyboards::summary_actions(&summary))
                .await?;

            record.ui.summary = Some(summary_id);
            record.ui.buttons = Some(buttons.id.0);
            deps.conversations.put(user_id, record);
        }

        FormOutcome::Reprompt(text) => {
            cleanup::retract(bot, chat_id, &mut record.ui.last_prompt).await;
            let sent = bot.send_message(chat_id, text).await?;
            record.ui.last_prompt = Some(sent.id.0);
            deps.conversations.put(user_id, record);
        }

        FormOutcome::Submit => {
            let Some(fields) = record.data.form().cloned() else {
                return Ok(());
            };

            match submit::submit(
                deps.gateway.as_ref(),
                &deps.db_pool,
                &config::CHANNEL_USERNAME,
                &fields,
            )
            .await
            {
                Ok(receipt) => {
                    cleanup::retract(bot, chat_id, &mut record.ui.last_prompt).await;
                    cleanup::retract(bot, chat_id, &mut record.ui.summary).await;
                    cleanup::retract(bot, chat_id, &mut record.ui.buttons).await;
                    deps.conversations.clear(user_id);

                    let text = match receipt.kind {
                        crate::storage::db::ItemKind::Found => {
                            "✅ Published to the feed. Thank you for helping someone out!"
                        }
                        crate::storage::db::ItemKind::Lost => {
                            "✅ Your lost-item report is on the feed. Good luck!"
                        }
                    };
                    let sent = bot.send_message(chat_id, text).await?;
                    cleanup::delete_after_delay(
                        bot.clone(),
                        chat_id,
                        sent.id.0,
                        config::cleanup::notice_delay(),
                    );
                }
                Err(e) => {
                    log::error!("Submission for user {} failed: {}", user_id, e);
                    // The form stays on the summary so the user can retry.
                    deps.conversations.put(user_id, record);
                    bot.send_message(chat_id, "⚠️ Could not publish your report right now. Try ✅ Confirm again in a moment.")
                        .await?;
                }
            }
        }

        FormOutcome::Ignored => {}
    }
    Ok(())
}
