//! Tracked pair management

use std::sync::Arc;

use signal_engine::exchange::normalize_symbol;
use teloxide::prelude::*;
use tracing::{error, info};

use crate::commands::message_locale;
use crate::i18n;
use crate::state::{AppState, BotState, HandlerResult, MyDialogue};

#[derive(Debug, PartialEq)]
pub enum AddPairOutcome {
    Added(String),
    Invalid,
}

/// Normalises `raw` (e.g. `btc/usdt` to `BTCUSDT`) and tracks it.
pub async fn add_pair(state: &AppState, raw: &str) -> Result<AddPairOutcome, anyhow::Error> {
    let Ok(pair) = normalize_symbol(raw) else {
        return Ok(AddPairOutcome::Invalid);
    };
    state.store.add_pair(&pair).await?;
    info!("Tracking pair {}", pair);
    Ok(AddPairOutcome::Added(pair))
}

async fn reply_add_pair(bot: &Bot, msg: &Message, state: &AppState, raw: &str) -> Result<bool, anyhow::Error> {
    let locale = message_locale(msg);
    let text = match add_pair(state, raw).await {
        Ok(AddPairOutcome::Added(pair)) => {
            bot.send_message(
                msg.chat.id,
                i18n::translate(locale, "pair_added", Some(&[("pair", pair.as_str())])),
            )
            .await?;
            return Ok(true);
        }
        Ok(AddPairOutcome::Invalid) => {
            i18n::translate(locale, "pair_invalid", Some(&[("pair", raw.trim())]))
        }
        Err(e) => {
            error!("Failed to add pair {:?}: {:#}", raw, e);
            i18n::translate(locale, "error_generic", None)
        }
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(false)
}

/// Handler for `/addpair SYMBOL`
pub async fn handle_add_pair(
    bot: Bot,
    msg: Message,
    symbol: String,
    state: Arc<AppState>,
) -> HandlerResult {
    if symbol.trim().is_empty() {
        let locale = message_locale(&msg);
        bot.send_message(msg.chat.id, i18n::translate(locale, "addpair_usage", None))
            .await?;
        return Ok(());
    }
    reply_add_pair(&bot, &msg, &state, &symbol).await?;
    Ok(())
}

/// Dialogue step after the "add pair" button; stays in the step until a
/// valid symbol arrives.
pub async fn handle_pair_input(
    bot: Bot,
    dialogue: MyDialogue,
    msg: Message,
    state: Arc<AppState>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if reply_add_pair(&bot, &msg, &state, text).await? {
        dialogue.update(BotState::Normal).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{test_state, ScriptedSource};
    use signal_engine::model::SignalModel;

    #[tokio::test]
    async fn pairs_are_normalised_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(
            ScriptedSource::fixed(Vec::new()),
            SignalModel::load(dir.path()).unwrap(),
            0.5,
        )
        .await;

        assert_eq!(
            add_pair(&state, " btc/usdt ").await.unwrap(),
            AddPairOutcome::Added("BTCUSDT".into())
        );
        assert_eq!(
            add_pair(&state, "BTCUSDT").await.unwrap(),
            AddPairOutcome::Added("BTCUSDT".into())
        );
        assert_eq!(add_pair(&state, "btc usdt!").await.unwrap(), AddPairOutcome::Invalid);
        assert_eq!(state.store.get_pairs().await.unwrap(), vec!["BTCUSDT"]);
    }
}
