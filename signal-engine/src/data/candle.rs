//! OHLCV candle data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::Timeframe;

/// OHLCV candle data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket open time
    pub timestamp: DateTime<Utc>,
    /// Opening price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Volume
    pub volume: f64,
}

impl Candle {
    /// Create a new candle
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// End of the bucket this candle covers
    pub fn close_time(&self, timeframe: Timeframe) -> DateTime<Utc> {
        self.timestamp + timeframe.duration()
    }

    /// Whether the bucket has ended at `now`. The newest kline of an
    /// exchange response is usually still forming.
    pub fn is_closed(&self, timeframe: Timeframe, now: DateTime<Utc>) -> bool {
        self.close_time(timeframe) <= now
    }
}

/// Leading run of `candles` (ascending) whose buckets have ended at `now`
pub fn closed_candles(candles: &[Candle], timeframe: Timeframe, now: DateTime<Utc>) -> &[Candle] {
    let open = candles
        .iter()
        .rev()
        .take_while(|c| !c.is_closed(timeframe, now))
        .count();
    &candles[..candles.len() - open]
}

/// Candles of one symbol and timeframe, ascending by timestamp without
/// duplicate timestamps.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build a series from candles in any order. Later duplicates of a
    /// timestamp replace earlier ones.
    pub fn from_vec(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        let mut normalized: Vec<Candle> = Vec::with_capacity(candles.len());
        for candle in candles {
            match normalized.last_mut() {
                Some(last) if last.timestamp == candle.timestamp => *last = candle,
                _ => normalized.push(candle),
            }
        }
        Self { candles: normalized }
    }

    /// Get number of candles
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Check if series is empty
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Get last candle
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Get all candles
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn into_vec(self) -> Vec<Candle> {
        self.candles
    }

    /// Keep only the newest `limit` candles
    pub fn truncate_front(&mut self, limit: usize) {
        if self.candles.len() > limit {
            self.candles.drain(..self.candles.len() - limit);
        }
    }
}

impl From<Vec<Candle>> for CandleSeries {
    fn from(candles: Vec<Candle>) -> Self {
        Self::from_vec(candles)
    }
}
