//! Bot initialization and the command surface.

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "I can:")]
pub enum Command {
    #[command(description = "register and show the welcome message")]
    Start,
    #[command(description = "how the bot works")]
    Help,
    #[command(description = "report an item you found")]
    Found,
    #[command(description = "search for a lost item or report it")]
    Lost,
    #[command(description = "manage category notifications")]
    Notification,
    #[command(description = "browse found items by date")]
    Calendar,
    #[command(description = "list all stored items (admins only)")]
    Showall,
    #[command(description = "broadcast a message to all users (admins only)")]
    Sendall,
}

/// Creates a Bot instance from the `TELOXIDE_TOKEN` environment variable.
pub fn create_bot() -> anyhow::Result<Bot> {
    Ok(Bot::from_env())
}

/// Sets up the command list shown in the Telegram UI. Admin-only commands are
/// left out of the menu on purpose; they still work when typed.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![
        BotCommand::new("start", "register and show the welcome message"),
        BotCommand::new("help", "how the bot works"),
        BotCommand::new("found", "report an item you found"),
        BotCommand::new("lost", "search for a lost item or report it"),
        BotCommand::new("notification", "manage category notifications"),
        BotCommand::new("calendar", "browse found items by date"),
    ])
    .await?;

    Ok(())
}
