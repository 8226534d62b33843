use async_trait::async_trait;
use shared::{NewSignal, Signal, SignalStatus};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html;
use tracing::info;

use crate::i18n;

/// Destination for signal announcements
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), anyhow::Error>;
}

/// Posts HTML messages to one chat
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), anyhow::Error> {
        self.bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}

/// Used when no announcement chat is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) -> Result<(), anyhow::Error> {
        info!("Signal announcement (no SIGNAL_CHAT_ID set): {}", text);
        Ok(())
    }
}

fn price(value: f64) -> String {
    format!("{:.4}", value)
}

fn percent(probability: f64) -> String {
    format!("{:.1}", probability * 100.0)
}

pub fn format_signal_message(locale: &str, signal: &NewSignal) -> String {
    let pair = html::escape(&signal.pair);
    let direction = signal.direction.as_str().to_uppercase();
    let (entry, tp, sl) = (price(signal.price), price(signal.tp), price(signal.sl));
    let probability = percent(signal.probability);
    let eta = signal.eta.to_string();
    i18n::translate(
        locale,
        "signal_new",
        Some(&[
            ("pair", pair.as_str()),
            ("direction", direction.as_str()),
            ("timeframe", signal.timeframe.as_str()),
            ("price", entry.as_str()),
            ("tp", tp.as_str()),
            ("sl", sl.as_str()),
            ("probability", probability.as_str()),
            ("eta", eta.as_str()),
        ]),
    )
}

pub fn format_close_message(locale: &str, signal: &Signal, status: SignalStatus) -> String {
    let pair = html::escape(&signal.pair);
    let direction = signal.direction.as_str().to_uppercase();
    let id = signal.id.to_string();
    i18n::translate(
        locale,
        "signal_closed",
        Some(&[
            ("id", id.as_str()),
            ("pair", pair.as_str()),
            ("direction", direction.as_str()),
            ("result", status.result_label().unwrap_or(status.as_str())),
        ]),
    )
}

/// One line per signal for the menu screen
pub fn format_signal_line(locale: &str, signal: &Signal) -> String {
    let direction = signal.direction.as_str().to_uppercase();
    let (entry, tp, sl) = (price(signal.price), price(signal.tp), price(signal.sl));
    let probability = percent(signal.probability);
    i18n::translate(
        locale,
        "signal_line",
        Some(&[
            ("pair", signal.pair.as_str()),
            ("direction", direction.as_str()),
            ("price", entry.as_str()),
            ("tp", tp.as_str()),
            ("sl", sl.as_str()),
            ("probability", probability.as_str()),
        ]),
    )
}
