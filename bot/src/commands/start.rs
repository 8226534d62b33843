use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use crate::commands::menu::send_main_menu;
use crate::commands::message_locale;
use crate::i18n;
use crate::state::{AppState, HandlerResult, MyDialogue};

/// Handler for /start, /menu and the menu trigger phrases
pub async fn handle_start(
    bot: Bot,
    dialogue: MyDialogue,
    msg: Message,
    _state: Arc<AppState>,
) -> HandlerResult {
    let locale = message_locale(&msg);
    info!(
        "Opening main menu for chat {} (locale: {})",
        msg.chat.id, locale
    );
    dialogue.exit().await?;
    send_main_menu(&bot, msg.chat.id, locale).await
}

/// Whether a plain text message asks for the menu
pub fn is_menu_trigger(text: &str) -> bool {
    i18n::menu_triggers().contains(&text.trim())
}
