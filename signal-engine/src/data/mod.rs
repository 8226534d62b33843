//! Data management module
//!
//! OHLCV candles, ordered candle series and the supported timeframes.

pub mod candle;
pub mod timeframe;

pub use candle::*;
pub use timeframe::*;
