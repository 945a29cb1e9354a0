//! Messaging gateway seam.
//!
//! The submission pipeline, moderation overlay, and broadcast never talk to
//! teloxide directly; they go through `MessageGateway` so their
//! partial-failure contracts can be exercised against a recording mock.
//! Interactive handlers keep using the `Bot` directly — prompts and cleanup
//! have no contract worth mocking.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, InlineKeyboardMarkup, MessageId, Recipient};
use thiserror::Error;

/// Where a message goes: a user chat or the public feed channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChatRef {
    User(i64),
    Channel(String),
}

impl ChatRef {
    fn recipient(&self) -> Recipient {
        match self {
            ChatRef::User(id) => Recipient::Id(ChatId(*id)),
            ChatRef::Channel(username) => Recipient::ChannelUsername(username.clone()),
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Injected by the mock; production code never constructs this.
    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Outbound messaging capability, reduced to what the pipelines need.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Send a text message; returns the new message id.
    async fn send_text(
        &self,
        chat: &ChatRef,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i32, GatewayError>;

    /// Send a photo (by file id) with a caption; returns the new message id.
    async fn send_photo(
        &self,
        chat: &ChatRef,
        photo_file_id: &str,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i32, GatewayError>;

    /// Replace the caption (and optionally the keyboard) of a message.
    async fn edit_caption(
        &self,
        chat: &ChatRef,
        message_id: i32,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError>;

    /// Replace only the inline keyboard of a message.
    async fn edit_markup(
        &self,
        chat: &ChatRef,
        message_id: i32,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), GatewayError>;

    /// Delete a message.
    async fn delete_message(&self, chat: &ChatRef, message_id: i32) -> Result<(), GatewayError>;
}

/// Production gateway backed by the teloxide `Bot`.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MessageGateway for TelegramGateway {
    async fn send_text(
        &self,
        chat: &ChatRef,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i32, GatewayError> {
        let mut req = self.bot.send_message(chat.recipient(), text);
        if let Some(kb) = keyboard {
            req = req.reply_markup(kb);
        }
        let msg = req.await?;
        Ok(msg.id.0)
    }

    async fn send_photo(
        &self,
        chat: &ChatRef,
        photo_file_id: &str,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i32, GatewayError> {
        let photo = InputFile::file_id(FileId(photo_file_id.to_string()));
        let mut req = self.bot.send_photo(chat.recipient(), photo).caption(caption);
        if let Some(kb) = keyboard {
            req = req.reply_markup(kb);
        }
        let msg = req.await?;
        Ok(msg.id.0)
    }

    async fn edit_caption(
        &self,
        chat: &ChatRef,
        message_id: i32,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError> {
        let mut req = self
            .bot
            .edit_message_caption(chat.recipient(), MessageId(message_id))
            .caption(caption);
        if let Some(kb) = keyboard {
            req = req.reply_markup(kb);
        }
        req.await?;
        Ok(())
    }

    async fn edit_markup(
        &self,
        chat: &ChatRef,
        message_id: i32,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), GatewayError> {
        self.bot
            .edit_message_reply_markup(chat.recipient(), MessageId(message_id))
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat: &ChatRef, message_id: i32) -> Result<(), GatewayError> {
        self.bot
            .delete_message(chat.recipient(), MessageId(message_id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    //! Recording gateway for pipeline tests, with per-chat failure injection.

    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
    use std::sync::Mutex;

    /// A recorded gateway call, with just enough detail for assertions.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum GatewayCall {
        SendText { chat: ChatRef, text: String, has_keyboard: bool },
        SendPhoto { chat: ChatRef, photo: String, caption: String, has_keyboard: bool },
        EditCaption { chat: ChatRef, message_id: i32, caption: String, has_keyboard: bool },
        EditMarkup { chat: ChatRef, message_id: i32 },
        Delete { chat: ChatRef, message_id: i32 },
    }

    #[derive(Default)]
    pub struct MockGateway {
        calls: Mutex<Vec<GatewayCall>>,
        fail_sends_to: Mutex<HashSet<ChatRef>>,
        fail_all_sends: AtomicBool,
        fail_edits: AtomicBool,
        next_id: AtomicI32,
    }

    impl MockGateway {
        pub fn new() -> Self {
            Self {
                next_id: AtomicI32::new(1000),
                ..Self::default()
            }
        }

        /// Every subsequent send to `chat` fails.
        pub fn fail_sends_to(&self, chat: ChatRef) {
            self.fail_sends_to.lock().unwrap().insert(chat);
        }

        /// Every subsequent send fails, regardless of target.
        pub fn fail_all_sends(&self) {
            self.fail_all_sends.store(true, Ordering::SeqCst);
        }

        /// Every subsequent caption/markup edit fails.
        pub fn fail_edits(&self) {
            self.fail_edits.store(true, Ordering::SeqCst);
        }

        pub fn calls(&self) -> Vec<GatewayCall> {
            self.calls.lock().unwrap().clone()
        }

        fn send_allowed(&self, chat: &ChatRef) -> Result<(), GatewayError> {
            if self.fail_all_sends.load(Ordering::SeqCst) {
                return Err(GatewayError::Rejected("send disabled".into()));
            }
            if self.fail_sends_to.lock().unwrap().contains(chat) {
                return Err(GatewayError::Rejected(format!("send to {:?} disabled", chat)));
            }
            Ok(())
        }

        fn record(&self, call: GatewayCall) -> i32 {
            self.calls.lock().unwrap().push(call);
            self.next_id.fetch_add(1, Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MessageGateway for MockGateway {
        async fn send_text(
            &self,
            chat: &ChatRef,
            text: &str,
            keyboard: Option<InlineKeyboardMarkup>,
        ) -> Result<i32, GatewayError> {
            self.send_allowed(chat)?;
            Ok(self.record(GatewayCall::SendText {
                chat: chat.clone(),
                text: text.to_string(),
                has_keyboard: keyboard.is_some(),
            }))
        }

        async fn send_photo(
            &self,
            chat: &ChatRef,
            photo_file_id: &str,
            caption: &str,
            keyboard: Option<InlineKeyboardMarkup>,
        ) -> Result<i32, GatewayError> {
            self.send_allowed(chat)?;
            Ok(self.record(GatewayCall::SendPhoto {
                chat: chat.clone(),
                photo: photo_file_id.to_string(),
                caption: caption.to_string(),
                has_keyboard: keyboard.is_some(),
            }))
        }

        async fn edit_caption(
            &self,
            chat: &ChatRef,
            message_id: i32,
            caption: &str,
            keyboard: Option<InlineKeyboardMarkup>,
        ) -> Result<(), GatewayError> {
            if self.fail_edits.load(Ordering::SeqCst) {
                return Err(GatewayError::Rejected("edit disabled".into()));
            }
            self.record(GatewayCall::EditCaption {
                chat: chat.clone(),
                message_id,
                caption: caption.to_string(),
                has_keyboard: keyboard.is_some(),
            });
            Ok(())
        }

        async fn edit_markup(
            &self,
            chat: &ChatRef,
            message_id: i32,
            _keyboard: InlineKeyboardMarkup,
        ) -> Result<(), GatewayError> {
            if self.fail_edits.load(Ordering::SeqCst) {
                return Err(GatewayError::Rejected("edit disabled".into()));
            }
            self.record(GatewayCall::EditMarkup {
                chat: chat.clone(),
                message_id,
            });
            Ok(())
        }

        async fn delete_message(&self, chat: &ChatRef, message_id: i32) -> Result<(), GatewayError> {
            self.record(GatewayCall::Delete {
                chat: chat.clone(),
                message_id,
            });
            Ok(())
        }
    }
}
