use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::{dispatching::{dialogue, UpdateHandler}, prelude::*};
use tracing_subscriber::EnvFilter;

mod commands;
mod i18n;
mod services;
mod state;

use crate::commands::{
    handle_add_pair, handle_help, handle_invalid, handle_menu_callback, handle_pair_input,
    handle_start, is_menu_trigger, Command,
};
use crate::services::{LogNotifier, Notifier, SignalMonitor, SignalScanner, TelegramNotifier};
use crate::state::{AppState, BotState};

fn schema() -> UpdateHandler<anyhow::Error> {
    use dptree::case;
    // Commands work in any dialogue state
    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(handle_start))
        .branch(case![Command::Menu].endpoint(handle_start))
        .branch(case![Command::Help].endpoint(handle_help))
        .branch(case![Command::AddPair(symbol)].endpoint(handle_add_pair));

    let menu_trigger = dptree::filter(|msg: Message| msg.text().is_some_and(is_menu_trigger))
        .endpoint(handle_start);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(menu_trigger)
        .branch(case![BotState::WaitingForPair].endpoint(handle_pair_input))
        .branch(dptree::endpoint(handle_invalid));

    let callback_query_handler = Update::filter_callback_query().endpoint(handle_menu_callback);

    dialogue::enter::<Update, InMemStorage<BotState>, BotState, _>()
        .branch(message_handler)
        .branch(callback_query_handler)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting signal bot...");

    let config = shared::Config::from_env()?;
    let bot = Bot::new(config.require_bot_token()?);
    let signal_chat_id = config.signal_chat_id;

    let app_state = Arc::new(AppState::new(config).await?);
    tracing::info!("AppState initialized");

    let notifier: Arc<dyn Notifier> = match signal_chat_id {
        Some(chat_id) => Arc::new(TelegramNotifier::new(bot.clone(), chat_id)),
        None => {
            tracing::warn!("SIGNAL_CHAT_ID is not set, signals will only be logged");
            Arc::new(LogNotifier)
        }
    };
    tokio::spawn(SignalScanner::new(app_state.as_ref().clone(), notifier.clone()).run());
    tokio::spawn(SignalMonitor::new(app_state.as_ref().clone(), notifier).run());

    let mut dispatcher = Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![
            InMemStorage::<BotState>::new(),
            app_state.clone()
        ])
        .enable_ctrlc_handler()
        .build();

    tracing::info!("Bot is running and waiting for updates...");
    dispatcher.dispatch().await;

    Ok(())
}
