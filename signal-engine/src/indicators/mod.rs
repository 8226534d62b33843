//! Technical indicators module
//!
//! Streaming indicators over candle closes and volumes. Moving averages use
//! the adjusted exponentially weighted mean, so every value is defined from
//! the first observation on.

pub mod ema;
pub mod obv;
pub mod rsi;

pub use ema::*;
pub use obv::*;
pub use rsi::*;

/// Indicator trait for all indicators
pub trait Indicator {
    /// Value fed on every candle
    type Input;

    /// Get the name of the indicator
    fn name(&self) -> &str;

    /// Update indicator with new value
    fn update(&mut self, input: Self::Input);

    /// Get current indicator value
    fn value(&self) -> Option<f64>;

    /// Check if indicator has seen a full window
    fn is_ready(&self) -> bool;
}
