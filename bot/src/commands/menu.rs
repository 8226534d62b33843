//! Inline main menu and its screens

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{error, info};

use crate::i18n;
use crate::services::notifier::format_signal_line;
use crate::state::{AppState, BotState, HandlerResult, MyDialogue};

pub const CB_SIGNALS: &str = "signals";
pub const CB_PAIRS: &str = "pairs";
pub const CB_STATS: &str = "stats";
pub const CB_SETTINGS: &str = "settings";
pub const CB_BACK: &str = "back";
pub const CB_ADD_PAIR: &str = "add_pair";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    Signals,
    Pairs,
    Stats,
    Settings,
}

impl Screen {
    pub fn from_callback(data: &str) -> Option<Self> {
        match data {
            CB_SIGNALS => Some(Screen::Signals),
            CB_PAIRS => Some(Screen::Pairs),
            CB_STATS => Some(Screen::Stats),
            CB_SETTINGS => Some(Screen::Settings),
            CB_BACK => Some(Screen::Main),
            _ => None,
        }
    }
}

/// Four buttons in a 2x2 grid
pub fn main_menu_keyboard(locale: &str) -> InlineKeyboardMarkup {
    let button = |key: &str, data: &str| {
        InlineKeyboardButton::callback(i18n::get_button_text(locale, key), data.to_string())
    };
    InlineKeyboardMarkup::new(vec![
        vec![button("btn_signals", CB_SIGNALS), button("btn_pairs", CB_PAIRS)],
        vec![button("btn_stats", CB_STATS), button("btn_settings", CB_SETTINGS)],
    ])
}

pub fn back_keyboard(locale: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        i18n::get_button_text(locale, "btn_back"),
        CB_BACK.to_string(),
    )]])
}

fn pairs_keyboard(locale: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            i18n::get_button_text(locale, "btn_add_pair"),
            CB_ADD_PAIR.to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            i18n::get_button_text(locale, "btn_back"),
            CB_BACK.to_string(),
        )],
    ])
}

/// Text and keyboard of a screen
pub async fn render_screen(
    state: &AppState,
    locale: &str,
    screen: Screen,
) -> Result<(String, InlineKeyboardMarkup), anyhow::Error> {
    let rendered = match screen {
        Screen::Main => (
            i18n::translate(locale, "menu_title", None),
            main_menu_keyboard(locale),
        ),
        Screen::Signals => {
            let signals = state.store.active_signals().await?;
            let text = if signals.is_empty() {
                i18n::translate(locale, "signals_empty", None)
            } else {
                let lines: Vec<String> = signals
                    .iter()
                    .map(|s| format_signal_line(locale, s))
                    .collect();
                format!("{}\n{}", i18n::translate(locale, "signals_title", None), lines.join("\n"))
            };
            (text, back_keyboard(locale))
        }
        Screen::Pairs => {
            let pairs = state.store.get_pairs().await?;
            let text = if pairs.is_empty() {
                i18n::translate(locale, "pairs_empty", None)
            } else {
                format!("{}\n{}", i18n::translate(locale, "pairs_title", None), pairs.join("\n"))
            };
            (text, pairs_keyboard(locale))
        }
        Screen::Stats => {
            let summary = state.store.result_summary().await?;
            let text = if summary.is_empty() {
                i18n::translate(locale, "stats_empty", None)
            } else {
                let lines: Vec<String> = summary
                    .iter()
                    .map(|row| format!("{}: {}", row.result, row.count))
                    .collect();
                format!("{}\n{}", i18n::translate(locale, "stats_title", None), lines.join("\n"))
            };
            (text, back_keyboard(locale))
        }
        Screen::Settings => {
            let threshold = format!("{:.2}", state.rules.threshold);
            let timeframes = shared::TIMEFRAMES.join(", ");
            let text = i18n::translate(
                locale,
                "settings_text",
                Some(&[
                    ("threshold", threshold.as_str()),
                    ("timeframe", state.timeframe.as_str()),
                    ("timeframes", timeframes.as_str()),
                ]),
            );
            (text, back_keyboard(locale))
        }
    };
    Ok(rendered)
}

/// Sends the main menu as a new message
pub async fn send_main_menu(bot: &Bot, chat_id: ChatId, locale: &str) -> HandlerResult {
    bot.send_message(chat_id, i18n::translate(locale, "menu_title", None))
        .reply_markup(main_menu_keyboard(locale))
        .await?;
    Ok(())
}

/// Handler for the inline menu buttons; screens replace the menu message
pub async fn handle_menu_callback(
    bot: Bot,
    dialogue: MyDialogue,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> HandlerResult {
    let locale = i18n::get_user_language(q.from.language_code.as_deref());
    let (Some(data), Some(msg)) = (q.data.as_deref(), q.message.as_ref()) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = msg.chat().id;
    let message_id = msg.id();
    info!("Menu callback {} from user {}", data, q.from.id.0);

    if data == CB_ADD_PAIR {
        dialogue.update(BotState::WaitingForPair).await?;
        bot.send_message(chat_id, i18n::translate(locale, "pair_prompt", None))
            .await?;
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    }

    let Some(screen) = Screen::from_callback(data) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    if screen == Screen::Main {
        dialogue.update(BotState::Normal).await?;
    }

    let (text, markup) = match render_screen(&state, locale, screen).await {
        Ok(rendered) => rendered,
        Err(e) => {
            error!("Failed to render {:?} screen: {:#}", screen, e);
            (i18n::translate(locale, "error_generic", None), back_keyboard(locale))
        }
    };
    bot.edit_message_text(chat_id, message_id, text)
        .reply_markup(markup)
        .await?;
    bot.answer_callback_query(q.id.clone()).await?;
    Ok(())
}
