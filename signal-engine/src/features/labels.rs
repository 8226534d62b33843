//! Training labels

use crate::data::Candle;

/// 1.0 when the close `horizon` candles ahead is above the current close,
/// 0.0 otherwise, NaN for the last `horizon` rows.
pub fn forward_return_labels(candles: &[Candle], horizon: usize) -> Vec<f64> {
    (0..candles.len())
        .map(|i| match candles.get(i + horizon) {
            Some(future) if horizon > 0 => {
                if future.close > candles[i].close {
                    1.0
                } else {
                    0.0
                }
            }
            _ => f64::NAN,
        })
        .collect()
}
