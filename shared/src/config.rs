use anyhow::{bail, Context};
use dotenv::dotenv;
use std::path::PathBuf;

/// Timeframes the scanner and the trainer accept.
pub const TIMEFRAMES: [&str; 6] = ["5m", "15m", "30m", "1h", "4h", "1d"];

pub struct Config {
    pub bot_token: String,
    pub bybit_api_key: String,
    pub bybit_api_secret: String,
    pub bybit_base_url: String,
    pub model_threshold: f64,
    pub database_path: PathBuf,
    pub model_dir: PathBuf,
    pub scan_timeframe: String,
    pub scan_limit: u32,
    pub scan_interval_secs: u64,
    pub monitor_interval_secs: u64,
    pub rate_limit_ms: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
    pub signal_eta: i32,
    pub signal_chat_id: Option<i64>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let config = Config {
            bot_token: std::env::var("BOT_TOKEN").unwrap_or_default(),
            bybit_api_key: std::env::var("BYBIT_API_KEY").unwrap_or_default(),
            bybit_api_secret: std::env::var("BYBIT_API_SECRET").unwrap_or_default(),
            bybit_base_url: std::env::var("BYBIT_BASE_URL")
                .unwrap_or_else(|_| "https://api.bybit.com".to_string()),
            model_threshold: parse_var("MODEL_THRESHOLD", 0.5)?,
            database_path: std::env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage/bot.db")),
            model_dir: std::env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("model")),
            scan_timeframe: std::env::var("SCAN_TIMEFRAME").unwrap_or_else(|_| "1h".to_string()),
            scan_limit: parse_var("SCAN_LIMIT", 200)?,
            scan_interval_secs: parse_var("SCAN_INTERVAL_SECS", 300)?,
            monitor_interval_secs: parse_var("MONITOR_INTERVAL_SECS", 60)?,
            rate_limit_ms: parse_var("RATE_LIMIT_MS", 100)?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 10)?,
            max_retries: parse_var("MAX_RETRIES", 3)?,
            take_profit_pct: parse_var("TAKE_PROFIT_PCT", 2.0)?,
            stop_loss_pct: parse_var("STOP_LOSS_PCT", 1.0)?,
            signal_eta: parse_var("SIGNAL_ETA", 24)?,
            signal_chat_id: std::env::var("SIGNAL_CHAT_ID")
                .ok()
                .map(|v| v.parse::<i64>())
                .transpose()
                .context("SIGNAL_CHAT_ID must be an integer chat id")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Only the bot binary needs a token; the trainer runs without one.
    pub fn require_bot_token(&self) -> Result<&str, anyhow::Error> {
        if self.bot_token.trim().is_empty() {
            bail!("BOT_TOKEN is not set");
        }
        Ok(&self.bot_token)
    }

    /// SQLite connection url for `database_path`, created on first connect.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.database_path.display())
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if !(0.0..=1.0).contains(&self.model_threshold) {
            bail!("MODEL_THRESHOLD must be within [0, 1], got {}", self.model_threshold);
        }
        if !TIMEFRAMES.contains(&self.scan_timeframe.as_str()) {
            bail!(
                "SCAN_TIMEFRAME must be one of {:?}, got {}",
                TIMEFRAMES,
                self.scan_timeframe
            );
        }
        if self.scan_limit == 0 {
            bail!("SCAN_LIMIT must be positive");
        }
        if self.signal_eta <= 0 {
            bail!("SIGNAL_ETA must be positive");
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {}", name, raw)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default() {
        assert_eq!(parse_var::<f64>("SIGNALS_TEST_UNSET_VAR", 0.5).unwrap(), 0.5);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        std::env::set_var("SIGNALS_TEST_GARBAGE_VAR", "abc");
        assert!(parse_var::<u32>("SIGNALS_TEST_GARBAGE_VAR", 1).is_err());
    }

    #[test]
    fn database_url_points_at_file() {
        let config = Config {
            bot_token: "t".into(),
            bybit_api_key: String::new(),
            bybit_api_secret: String::new(),
            bybit_base_url: "https://api.bybit.com".into(),
            model_threshold: 0.5,
            database_path: PathBuf::from("storage/bot.db"),
            model_dir: PathBuf::from("model"),
            scan_timeframe: "1h".into(),
            scan_limit: 200,
            scan_interval_secs: 300,
            monitor_interval_secs: 60,
            rate_limit_ms: 100,
            request_timeout_secs: 10,
            max_retries: 3,
            take_profit_pct: 2.0,
            stop_loss_pct: 1.0,
            signal_eta: 24,
            signal_chat_id: None,
        };
        assert_eq!(config.database_url(), "sqlite://storage/bot.db?mode=rwc");
        assert!(config.validate().is_ok());
        assert_eq!(config.require_bot_token().unwrap(), "t");
    }
}
