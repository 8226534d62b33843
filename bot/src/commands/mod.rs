use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;

use crate::i18n;
use crate::state::{AppState, HandlerResult};

pub mod menu;
pub mod pairs;
pub mod start;

pub use menu::handle_menu_callback;
pub use pairs::{handle_add_pair, handle_pair_input};
pub use start::{handle_start, is_menu_trigger};

/// 🚨 Сигнальный бот. Доступные команды:
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Главное меню
    Start,
    /// Главное меню
    Menu,
    /// Справка
    Help,
    /// Добавить пару: /addpair BTCUSDT
    AddPair(String),
}

pub fn message_locale(msg: &Message) -> &'static str {
    i18n::get_user_language(msg.from.as_ref().and_then(|u| u.language_code.as_deref()))
}

pub async fn handle_help(bot: Bot, msg: Message, _state: Arc<AppState>) -> HandlerResult {
    let locale = message_locale(&msg);
    tracing::info!("Handling /help command in chat {} (locale: {})", msg.chat.id, locale);

    let mut help_text = i18n::translate(locale, "cmd_help_title", None);
    help_text.push_str(&format!("/start - {}\n", i18n::translate(locale, "cmd_help_start", None)));
    help_text.push_str(&format!("/menu - {}\n", i18n::translate(locale, "cmd_help_menu", None)));
    help_text.push_str(&format!(
        "/addpair BTCUSDT - {}\n",
        i18n::translate(locale, "cmd_help_addpair", None)
    ));
    help_text.push_str(&format!("/help - {}\n", i18n::translate(locale, "cmd_help_help", None)));

    bot.send_message(msg.chat.id, help_text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn handle_invalid(bot: Bot, msg: Message) -> HandlerResult {
    let locale = message_locale(&msg);
    bot.send_message(msg.chat.id, i18n::translate(locale, "error_invalid_command", None))
        .await?;
    Ok(())
}
