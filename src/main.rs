use std::sync::Arc;

use teloxide::prelude::*;

use lostfound::conversation::ConversationStore;
use lostfound::core::{config, init_logger};
use lostfound::gateway::{MessageGateway, TelegramGateway};
use lostfound::storage::create_pool;
use lostfound::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logger(&config::LOG_FILE_PATH)?;
    log::info!("Starting lost-and-found bot");

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Could not register the command menu: {}", e);
    }

    let db_pool = Arc::new(create_pool(&config::DB_PATH)?);
    let conversations = Arc::new(ConversationStore::new());
    let gateway: Arc<dyn MessageGateway> = Arc::new(TelegramGateway::new(bot.clone()));

    let deps = HandlerDeps::new(db_pool, conversations, gateway);
    let handler = schema(deps);

    log::info!("Dispatching updates for feed {}", *config::CHANNEL_USERNAME);
    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
