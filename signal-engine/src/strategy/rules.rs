//! Probability to signal

use serde::{Deserialize, Serialize};
use shared::{Config, Direction, NewSignal};

/// A trade the rules would open at `entry`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalProposal {
    pub direction: Direction,
    /// Model confidence in `direction`
    pub probability: f64,
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl SignalProposal {
    pub fn into_new_signal(self, pair: &str, timeframe: &str, eta: i32) -> NewSignal {
        NewSignal {
            pair: pair.to_string(),
            direction: self.direction,
            price: self.entry,
            tp: self.take_profit,
            sl: self.stop_loss,
            probability: self.probability,
            eta,
            timeframe: timeframe.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRules {
    /// Minimum probability for either direction
    pub threshold: f64,
    /// Percent distance of the take-profit from entry
    pub take_profit_pct: f64,
    /// Percent distance of the stop-loss from entry
    pub stop_loss_pct: f64,
    /// Candles a signal may stay open
    pub eta_candles: i32,
}

impl Default for SignalRules {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            take_profit_pct: 2.0,
            stop_loss_pct: 1.0,
            eta_candles: 24,
        }
    }
}

impl SignalRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold: config.model_threshold,
            take_profit_pct: config.take_profit_pct,
            stop_loss_pct: config.stop_loss_pct,
            eta_candles: config.signal_eta,
        }
    }

    /// LONG when `p_up` reaches the threshold, SHORT when `1 - p_up` does,
    /// nothing otherwise. LONG wins if both qualify.
    pub fn evaluate(&self, price: f64, p_up: f64) -> Option<SignalProposal> {
        if !price.is_finite() || price <= 0.0 || !(0.0..=1.0).contains(&p_up) {
            return None;
        }

        let tp = self.take_profit_pct / 100.0;
        let sl = self.stop_loss_pct / 100.0;
        if p_up >= self.threshold {
            Some(SignalProposal {
                direction: Direction::Long,
                probability: p_up,
                entry: price,
                take_profit: price * (1.0 + tp),
                stop_loss: price * (1.0 - sl),
            })
        } else if 1.0 - p_up >= self.threshold {
            Some(SignalProposal {
                direction: Direction::Short,
                probability: 1.0 - p_up,
                entry: price,
                take_profit: price * (1.0 - tp),
                stop_loss: price * (1.0 + sl),
            })
        } else {
            None
        }
    }

    pub fn new_signal(&self, pair: &str, timeframe: &str, price: f64, p_up: f64) -> Option<NewSignal> {
        self.evaluate(price, p_up)
            .map(|proposal| proposal.into_new_signal(pair, timeframe, self.eta_candles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(threshold: f64) -> SignalRules {
        SignalRules {
            threshold,
            ..SignalRules::default()
        }
    }

    #[test]
    fn long_above_threshold() {
        let p = rules(0.6).evaluate(100.0, 0.7).unwrap();
        assert_eq!(p.direction, Direction::Long);
        assert_eq!(p.probability, 0.7);
        assert!((p.take_profit - 102.0).abs() < 1e-9);
        assert!((p.stop_loss - 99.0).abs() < 1e-9);
    }

    #[test]
    fn short_mirrors_levels() {
        let p = rules(0.6).evaluate(100.0, 0.2).unwrap();
        assert_eq!(p.direction, Direction::Short);
        assert!((p.probability - 0.8).abs() < 1e-12);
        assert!((p.take_profit - 98.0).abs() < 1e-9);
        assert!((p.stop_loss - 101.0).abs() < 1e-9);
    }

    #[test]
    fn undecided_band_gives_nothing() {
        assert!(rules(0.6).evaluate(100.0, 0.5).is_none());
        assert!(rules(0.6).evaluate(100.0, f64::NAN).is_none());
        assert!(rules(0.6).evaluate(0.0, 0.9).is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(rules(0.5).evaluate(10.0, 0.5).unwrap().direction, Direction::Long);
    }

    #[test]
    fn new_signal_carries_pair_and_eta() {
        let s = rules(0.5).new_signal("BTCUSDT", "1h", 100.0, 0.9).unwrap();
        assert_eq!(s.pair, "BTCUSDT");
        assert_eq!(s.timeframe, "1h");
        assert_eq!(s.eta, 24);
        assert_eq!(s.direction, Direction::Long);
    }
}
