//! Closes ACTIVE signals on take-profit, stop-loss or expiry

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{Signal, SignalStatus};
use signal_engine::data::Timeframe;
use signal_engine::exchange::MAX_KLINE_LIMIT;
use signal_engine::strategy::resolve;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::i18n;
use crate::services::notifier::{format_close_message, Notifier};
use crate::state::AppState;

pub struct SignalMonitor {
    state: AppState,
    notifier: Arc<dyn Notifier>,
}

impl SignalMonitor {
    pub fn new(state: AppState, notifier: Arc<dyn Notifier>) -> Self {
        Self { state, notifier }
    }

    /// Candles to request so every candle opened since `signal` was created
    /// is included.
    fn candles_needed(signal: &Signal, timeframe: Timeframe, now: DateTime<Utc>) -> u32 {
        let elapsed = now - signal.created_at;
        let step = timeframe.duration().num_seconds().max(1);
        let count = elapsed.num_seconds().max(0) / step + 2;
        u32::try_from(count).unwrap_or(MAX_KLINE_LIMIT).min(MAX_KLINE_LIMIT)
    }

    /// Replays recent candles for every ACTIVE signal and closes the ones
    /// that are finished. Returns the closed signals with their new status.
    pub async fn check_once(&self) -> Result<Vec<(Signal, SignalStatus)>, anyhow::Error> {
        self.check_at(Utc::now()).await
    }

    /// `check_once` against a fixed clock; candles whose bucket has not
    /// ended by `now` can close a signal but never expire it.
    pub async fn check_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Signal, SignalStatus)>, anyhow::Error> {
        let active = self.state.store.active_signals().await?;
        let mut closed = Vec::new();

        for signal in active {
            let timeframe = signal.timeframe.parse::<Timeframe>().unwrap_or_else(|e| {
                warn!("Signal #{}: {}, using {}", signal.id, e, self.state.timeframe);
                self.state.timeframe
            });
            let limit = Self::candles_needed(&signal, timeframe, now);
            let candles = match self.state.market.fetch(&signal.pair, timeframe, limit).await {
                Ok(candles) => candles,
                Err(e) => {
                    warn!("Monitor could not fetch {}: {}", signal.pair, e);
                    continue;
                }
            };

            let Some(status) = resolve(&signal, &candles, timeframe, now) else {
                continue;
            };
            if !self.state.store.close_signal(signal.id, status).await? {
                continue;
            }
            if let Err(e) = self
                .notifier
                .notify(&format_close_message(i18n::DEFAULT_LOCALE, &signal, status))
                .await
            {
                warn!("Failed to announce close of signal #{}: {}", signal.id, e);
            }
            closed.push((signal, status));
        }

        Ok(closed)
    }

    pub async fn run(self) {
        let period = Duration::from_secs(self.state.config.monitor_interval_secs.max(1));
        info!("Signal monitor started (every {:?})", period);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.check_once().await {
                error!("Signal monitor pass failed: {:#}", e);
            }
        }
    }
}
