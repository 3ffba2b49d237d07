use std::env;
use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::PreCheckoutQuery;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kcal_bot::analysis::AnalysisClient;
use kcal_bot::bot::{self, AppState};
use kcal_bot::config::BotConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting calorie photo bot");

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Get secrets from environment
    let bot_token = env::var("TELEGRAM_BOT_TOKEN").expect("TELEGRAM_BOT_TOKEN must be set");
    let openai_api_key = env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");

    let config = BotConfig::default();
    let analyzer = AnalysisClient::new(openai_api_key, config.analysis.clone());
    let state = Arc::new(AppState::new(config, analyzer));

    // Initialize the bot
    let bot = Bot::new(bot_token);

    info!("Bot initialized, starting dispatcher");

    // Set up the dispatcher with shared state
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let state = Arc::clone(&state);
            move |bot: Bot, msg: Message| {
                let state = Arc::clone(&state);
                async move { bot::message_handler(bot, msg, state).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let state = Arc::clone(&state);
            move |bot: Bot, q: teloxide::types::CallbackQuery| {
                let state = Arc::clone(&state);
                async move { bot::callback_handler(bot, q, state).await }
            }
        }))
        .branch(
            Update::filter_pre_checkout_query().endpoint(
                |bot: Bot, q: PreCheckoutQuery| async move {
                    // Always accept; the payload is validated when the
                    // successful payment message arrives
                    bot.answer_pre_checkout_query(q.id, true).await?;
                    anyhow::Ok(())
                },
            ),
        );

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
