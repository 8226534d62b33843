//! Indicator rows per candle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::Candle;
use crate::indicators::{Indicator, EMA, OBV, RSI};

pub const EMA_SPANS: [usize; 3] = [20, 50, 200];
pub const RSI_PERIOD: usize = 14;

/// Column order of a table built from `FeatureRow`s
pub const FEATURE_COLUMNS: [&str; 10] = [
    "open", "high", "low", "close", "volume", "ema20", "ema50", "ema200", "rsi", "obv",
];

/// Candle values plus indicators, keyed by the candle timestamp.
/// `None` marks an indicator that is undefined at this row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    pub rsi: Option<f64>,
    pub obv: Option<f64>,
}

impl FeatureRow {
    /// Value of a column from `FEATURE_COLUMNS`
    pub fn get(&self, column: &str) -> Option<f64> {
        match column {
            "open" => Some(self.open),
            "high" => Some(self.high),
            "low" => Some(self.low),
            "close" => Some(self.close),
            "volume" => Some(self.volume),
            "ema20" => self.ema20,
            "ema50" => self.ema50,
            "ema200" => self.ema200,
            "rsi" => self.rsi,
            "obv" => self.obv,
            _ => None,
        }
    }
}

/// One row per candle, same order, nothing dropped.
pub fn build(candles: &[Candle]) -> Vec<FeatureRow> {
    let [short, medium, long] = EMA_SPANS;
    let mut ema20 = EMA::new(short);
    let mut ema50 = EMA::new(medium);
    let mut ema200 = EMA::new(long);
    let mut rsi = RSI::new(RSI_PERIOD);
    let mut obv = OBV::new();

    candles
        .iter()
        .map(|candle| {
            ema20.update(candle.close);
            ema50.update(candle.close);
            ema200.update(candle.close);
            rsi.update(candle.close);
            obv.update((candle.close, candle.volume));

            FeatureRow {
                timestamp: candle.timestamp,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume,
                ema20: ema20.value(),
                ema50: ema50.value(),
                ema200: ema200.value(),
                rsi: rsi.value(),
                obv: obv.value(),
            }
        })
        .collect()
}
