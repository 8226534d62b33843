//! RSI (Relative Strength Index) indicator

use crate::indicators::{Indicator, EMA};

/// RSI over close prices. Gains and losses are averaged with the adjusted
/// EMA of span `period`; `avg_loss == 0` yields 100.
#[derive(Debug, Clone)]
pub struct RSI {
    period: usize,
    gains: EMA,
    losses: EMA,
    prev_close: Option<f64>,
}

impl RSI {
    /// Create new RSI indicator
    pub fn new(period: usize) -> Self {
        Self {
            period,
            gains: EMA::new(period),
            losses: EMA::new(period),
            prev_close: None,
        }
    }

    /// Get RSI period
    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for RSI {
    type Input = f64;

    fn name(&self) -> &str {
        "RSI"
    }

    fn update(&mut self, close: f64) {
        if let Some(prev) = self.prev_close {
            let delta = close - prev;
            self.gains.update(delta.max(0.0));
            self.losses.update((-delta).max(0.0));
        }
        self.prev_close = Some(close);
    }

    fn value(&self) -> Option<f64> {
        let avg_gain = self.gains.value()?;
        let avg_loss = self.losses.value()?;
        Some(rsi_from_averages(avg_gain, avg_loss))
    }

    fn is_ready(&self) -> bool {
        // needs period deltas, i.e. period + 1 closes
        self.gains.is_ready()
    }
}

/// `100 - 100 / (1 + avg_gain / avg_loss)`, 100 when there were no losses
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Calculate RSI from a series of values
pub fn calculate_rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut rsi = RSI::new(period);
    values
        .iter()
        .map(|&value| {
            rsi.update(value);
            rsi.value()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi() {
        let mut rsi = RSI::new(14);
        let values = vec![100.0, 102.0, 101.0, 103.0, 105.0, 104.0, 106.0];

        for value in values {
            rsi.update(value);
        }

        // RSI needs at least period+1 values to be ready
        assert!(!rsi.is_ready());
        assert!(rsi.value().is_some());
    }

    #[test]
    fn test_first_value_undefined() {
        let values = calculate_rsi(&[10.0, 11.0], 14);
        assert_eq!(values[0], None);
        assert_eq!(values[1], Some(100.0));
    }

    #[test]
    fn test_no_losses_is_100() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let values = calculate_rsi(&closes, 14);
        assert!(values[1..].iter().all(|v| *v == Some(100.0)));

        let flat = calculate_rsi(&[5.0; 20], 14);
        assert!(flat[1..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn test_known_value() {
        // gains [1, 0] and losses [0, 1] with decay 13/15
        let values = calculate_rsi(&[1.0, 2.0, 1.0], 14);
        let expected = 100.0 * 13.0 / 28.0;
        assert!((values[2].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_bounds() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 100.0 + ((i * 37) % 17) as f64 - ((i * 11) % 7) as f64)
            .collect();
        for value in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }
}
