//! Periodic scan of tracked pairs for new signals

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::Signal;
use signal_engine::data::closed_candles;
use signal_engine::exchange::SymbolCandles;
use signal_engine::features::FeatureTable;
use signal_engine::model::ModelError;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::i18n;
use crate::services::notifier::{format_signal_message, Notifier};
use crate::state::AppState;

pub struct SignalScanner {
    state: AppState,
    notifier: Arc<dyn Notifier>,
}

impl SignalScanner {
    pub fn new(state: AppState, notifier: Arc<dyn Notifier>) -> Self {
        Self { state, notifier }
    }

    /// Scores the latest finished candle of every tracked pair and opens a
    /// signal where the rules fire and the pair has no ACTIVE signal.
    pub async fn scan_once(&self) -> Result<Vec<Signal>, anyhow::Error> {
        self.scan_at(Utc::now()).await
    }

    /// `scan_once` against a fixed clock; candles still forming at `now`
    /// are dropped before scoring.
    pub async fn scan_at(&self, now: DateTime<Utc>) -> Result<Vec<Signal>, anyhow::Error> {
        let pairs = self.state.store.get_pairs().await?;
        if pairs.is_empty() {
            debug!("No tracked pairs, skipping scan");
            return Ok(Vec::new());
        }
        if !self.state.model.is_trained() {
            warn!("Signal model is not trained, skipping scan of {} pairs", pairs.len());
            return Ok(Vec::new());
        }

        let timeframe = self.state.timeframe;
        let results = self
            .state
            .market
            .fetch_many(&pairs, timeframe, self.state.config.scan_limit)
            .await;

        let mut opened = Vec::new();
        for SymbolCandles { symbol, result } in results {
            let fetched = match result {
                Ok(candles) => candles,
                Err(e) => {
                    warn!("Failed to fetch {} candles for {}: {}", timeframe, symbol, e);
                    continue;
                }
            };
            let candles = closed_candles(&fetched, timeframe, now);
            let Some(last) = candles.last() else {
                debug!("No finished candles for {}", symbol);
                continue;
            };

            let table = FeatureTable::from_candles(candles).tail(1);
            let p_up = match self.state.model.predict(&table) {
                Ok(scores) => match scores.first() {
                    Some(p) => *p,
                    None => continue,
                },
                Err(ModelError::NotTrained) => {
                    warn!("Signal model is not trained, stopping scan");
                    break;
                }
                Err(e) => {
                    warn!("Scoring {} failed: {}", symbol, e);
                    continue;
                }
            };

            let Some(new_signal) =
                self.state
                    .rules
                    .new_signal(&symbol, timeframe.as_str(), last.close, p_up)
            else {
                debug!("{}: p_up {:.3} below threshold", symbol, p_up);
                continue;
            };

            let Some(id) = self.state.store.open_signal(&new_signal).await? else {
                continue;
            };
            if let Err(e) = self
                .notifier
                .notify(&format_signal_message(i18n::DEFAULT_LOCALE, &new_signal))
                .await
            {
                warn!("Failed to announce signal #{}: {}", id, e);
            }
            if let Some(signal) = self.state.store.get_signal(id).await? {
                opened.push(signal);
            }
        }

        Ok(opened)
    }

    pub async fn run(self) {
        let period = Duration::from_secs(self.state.config.scan_interval_secs.max(1));
        info!("Signal scanner started (every {:?}, {})", period, self.state.timeframe);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.scan_once().await {
                Ok(opened) if !opened.is_empty() => {
                    info!("Scan opened {} signal(s)", opened.len())
                }
                Ok(_) => {}
                Err(e) => error!("Signal scan failed: {:#}", e),
            }
        }
    }
}
