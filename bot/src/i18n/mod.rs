//! i18n module for handling translations
//!
//! Russian is the default locale; clients reporting an English language code
//! get English texts.

pub const DEFAULT_LOCALE: &str = "ru";

/// Locale for a Telegram `language_code`
pub fn get_user_language(language_code: Option<&str>) -> &'static str {
    match language_code {
        Some(code) if code.to_lowercase().starts_with("en") => "en",
        _ => DEFAULT_LOCALE,
    }
}

/// Get translation for a key with optional `{name}` arguments
pub fn translate(locale: &str, key: &str, args: Option<&[(&str, &str)]>) -> String {
    let mut text = message(locale, key)
        .or_else(|| message(DEFAULT_LOCALE, key))
        .unwrap_or(key)
        .to_string();
    if let Some(args) = args {
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
    }
    text
}

/// Inline button captions
pub fn get_button_text(locale: &str, key: &str) -> String {
    let text = match (locale, key) {
        ("en", "btn_signals") => "🚨Signals",
        (_, "btn_signals") => "🚨Сигналы",
        ("en", "btn_pairs") => "👀My pairs",
        (_, "btn_pairs") => "👀Мои пары",
        ("en", "btn_stats") => "📊Statistics",
        (_, "btn_stats") => "📊Статистика",
        ("en", "btn_settings") => "⚙️Settings",
        (_, "btn_settings") => "⚙️Настройки",
        ("en", "btn_back") => "Back",
        (_, "btn_back") => "Назад",
        ("en", "btn_add_pair") => "➕Add pair",
        (_, "btn_add_pair") => "➕Добавить пару",
        _ => key,
    };
    text.to_string()
}

/// Texts that open the main menu, in every locale
pub fn menu_triggers() -> [&'static str; 2] {
    ["Показать меню", "Show menu"]
}

fn message(locale: &str, key: &str) -> Option<&'static str> {
    let text = match (locale, key) {
        // Menu
        ("ru", "menu_title") => "Главное меню",
        ("en", "menu_title") => "Main menu",

        // Signals
        ("ru", "signals_empty") => "Сигналы пока отсутствуют",
        ("en", "signals_empty") => "No signals yet",
        ("ru", "signals_title") => "Активные сигналы:",
        ("en", "signals_title") => "Active signals:",
        ("ru", "signal_line") => "{pair} {direction} от {price} · TP {tp} · SL {sl} · {probability}%",
        ("en", "signal_line") => "{pair} {direction} at {price} · TP {tp} · SL {sl} · {probability}%",
        ("ru", "signal_new") => "🚨 <b>Новый сигнал</b>\n\
            {pair} · <b>{direction}</b> · {timeframe}\n\
            Вход: {price}\nTP: {tp}\nSL: {sl}\n\
            Вероятность: {probability}%\nГоризонт: {eta} свечей",
        ("en", "signal_new") => "🚨 <b>New signal</b>\n\
            {pair} · <b>{direction}</b> · {timeframe}\n\
            Entry: {price}\nTP: {tp}\nSL: {sl}\n\
            Probability: {probability}%\nHorizon: {eta} candles",
        ("ru", "signal_closed") => "Сигнал #{id} {pair} {direction} закрыт: <b>{result}</b>",
        ("en", "signal_closed") => "Signal #{id} {pair} {direction} closed: <b>{result}</b>",

        // Pairs
        ("ru", "pairs_empty") => "Нет пар",
        ("en", "pairs_empty") => "No pairs",
        ("ru", "pairs_title") => "Отслеживаемые пары:",
        ("en", "pairs_title") => "Tracked pairs:",
        ("ru", "pair_prompt") => "Отправьте символ пары, например BTCUSDT",
        ("en", "pair_prompt") => "Send a pair symbol, for example BTCUSDT",
        ("ru", "pair_added") => "Пара {pair} добавлена",
        ("en", "pair_added") => "Pair {pair} added",
        ("ru", "pair_invalid") => "Неверный символ пары: {pair}",
        ("en", "pair_invalid") => "Invalid pair symbol: {pair}",
        ("ru", "addpair_usage") => "Использование: /addpair BTCUSDT",
        ("en", "addpair_usage") => "Usage: /addpair BTCUSDT",

        // Stats
        ("ru", "stats_empty") => "Статистика недоступна",
        ("en", "stats_empty") => "No statistics yet",
        ("ru", "stats_title") => "Статистика:",
        ("en", "stats_title") => "Statistics:",

        // Settings
        ("ru", "settings_text") => "Настройки:\n\
            Порог модели: {threshold}\n\
            Таймфрейм: {timeframe}\n\
            Доступные таймфреймы: {timeframes}",
        ("en", "settings_text") => "Settings:\n\
            Model threshold: {threshold}\n\
            Timeframe: {timeframe}\n\
            Supported timeframes: {timeframes}",

        // Help
        ("ru", "cmd_help_title") => "<b>Доступные команды</b>\n\n",
        ("en", "cmd_help_title") => "<b>Available commands</b>\n\n",
        ("ru", "cmd_help_start") => "главное меню",
        ("en", "cmd_help_start") => "main menu",
        ("ru", "cmd_help_menu") => "главное меню",
        ("en", "cmd_help_menu") => "main menu",
        ("ru", "cmd_help_addpair") => "добавить пару для отслеживания",
        ("en", "cmd_help_addpair") => "track a new pair",
        ("ru", "cmd_help_help") => "эта справка",
        ("en", "cmd_help_help") => "this help",

        // Errors
        ("ru", "error_generic") => "Произошла ошибка, попробуйте позже",
        ("en", "error_generic") => "Something went wrong, please try again later",
        ("ru", "error_invalid_command") => "Неизвестная команда. Список команд: /help",
        ("en", "error_invalid_command") => "Unknown command. See /help",

        _ => return None,
    };
    Some(text)
}
